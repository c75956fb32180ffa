//! Bit-banged DSHOT motor signals on Raspberry Pi GPIO pins.
//!
//! dshot-gpio drives ESCs from an ordinary GPIO pin: it maps the GPIO controller's
//! registers out of `/dev/mem` and shapes every pulse with a calibrated busy-wait
//! loop, so no PWM, DMA or UART peripheral is needed.
//!
//! # Features
//!
//! - **DSHOT150**: one timing profile, tuned on a BCM2837 (Raspberry Pi 3)
//! - **Explicit sessions**: no global state; the caller owns the register mapping
//! - **Checked inputs**: bad pins and throttle values are rejected before any register access
//! - **Calibration**: optional start-up check of the busy-wait loop against the clock
//! - **Testable**: every hardware access goes through [`RegisterWindow`], with an
//!   in-memory implementation for tests and dry runs
//!
//! ## Example
//!
//! ```rust,no_run
//! use dshot_gpio::{Command, Session};
//!
//! fn main() -> dshot_gpio::Result<()> {
//!     let mut session = Session::open()?;
//!
//!     session.send_command(Command::MotorStop, 5)?;
//!     for _ in 0..10_000 {
//!         session.send(99, 5)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (dry run)
//!
//! ```rust
//! use dshot_gpio::{MemoryRegisters, PulseRecorder, Session, SessionConfig, WirePacket};
//!
//! let mut session = Session::with_delay(
//!     MemoryRegisters::gpio_block(),
//!     PulseRecorder::new(),
//!     SessionConfig::default(),
//! )?;
//! session.send(48, 5)?;
//!
//! let profile = *session.profile();
//! assert_eq!(session.delay().frames(&profile), Some(vec![WirePacket(0x0606)]));
//! # Ok::<(), dshot_gpio::DshotError>(())
//! ```

// Core types and error handling
mod error;
pub mod types;

// Hardware access
pub mod gpio;
pub mod peripheral;
pub mod window;

// Signal generation
pub mod session;
pub mod timer;
pub mod transmit;

// Core exports
pub use error::*;
pub use types::*;

pub use session::{Session, SharedSession};
pub use timer::{BusyWait, Calibration, CalibrationReport, CycleDelay, SPIN_LOOP, SpinLoop};
pub use transmit::{Pulse, PulseRecorder, transmit};
pub use window::{MemoryRegisters, RegisterWindow};

// Hardware exports
#[cfg(unix)]
pub use peripheral::MappedRegisters;
