//! Spin four motors through a fixed throttle sequence.
//!
//! Sends throttle 48 (stopped) to GPIO 5, 7, 19 and 20 long enough for the ESCs
//! to arm, then 99 which should start the motors turning, then 199 which should
//! turn them a little faster. Needs root on a Raspberry Pi.
//!
//! ```text
//! sudo RUST_LOG=debug cargo run --example run_motors
//! ```

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MOTOR_PINS: [u32; 4] = [5, 7, 19, 20];

/// (throttle, rounds) where each round sends one frame to every motor.
const SEQUENCE: [(u16, usize); 3] = [(48, 10_000), (99, 20_000), (199, 10_000)];

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut session = dshot_gpio::Session::open().context("failed to open DSHOT session")?;

    for (throttle, rounds) in SEQUENCE {
        info!(throttle, rounds, pins = ?MOTOR_PINS, "Sending throttle");
        for _ in 0..rounds {
            for pin in MOTOR_PINS {
                session.send(throttle, pin)?;
            }
        }
    }

    info!(frames = session.frames_sent(), "Sequence complete");
    Ok(())
}

#[cfg(not(unix))]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    info!(?MOTOR_PINS, ?SEQUENCE, "GPIO access needs /dev/mem");
    Err(dshot_gpio::DshotError::unsupported_platform("GPIO mapping", "Raspberry Pi Linux").into())
}
