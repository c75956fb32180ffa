//! Core types for DSHOT signal generation.
//!
//! ## Architecture
//!
//! - [`ThrottlePacket`] is the caller-facing value: 11-bit throttle plus telemetry flag
//! - [`WirePacket`] is the 16-bit frame with checksum, rebuilt for every transmission
//! - [`Command`] names the reserved frame values 0-47
//! - [`GpioPin`] is a range-checked BCM pin number
//! - [`TimingProfile`] holds the busy-wait cycle counts of the four pulse phases
//! - [`SessionConfig`] bundles board, timing and calibration settings
//!
//! ## Usage Example
//!
//! ```rust
//! use dshot_gpio::types::{ThrottlePacket, WirePacket};
//!
//! let packet = ThrottlePacket::new(1046, true).unwrap();
//! let wire: WirePacket = packet.encode();
//! assert_eq!(wire.raw(), 0x82D7);
//! assert_eq!(wire.decode(), Some(packet));
//! ```

mod command;
mod config;
mod packet;
mod pin;
mod timing;

pub use command::Command;
pub use config::{Board, CalibrationPolicy, GPIO_OFFSET, SessionConfig};
pub use packet::{MAX_THROTTLE, MIN_THROTTLE, ThrottlePacket, WirePacket, checksum, encode};
pub use pin::{GpioPin, MAX_PIN, NUM_PINS};
pub use timing::{DSHOT150_BIT_NS, DSHOT150_T0H_NS, DSHOT150_T1H_NS, TimingProfile};
