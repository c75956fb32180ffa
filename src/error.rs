//! Error types for DSHOT signal generation.
//!
//! Every fallible operation in the crate returns [`DshotError`]. The variants fall
//! into three groups, and callers are expected to treat them differently:
//!
//! ## Error Categories
//!
//! - **Session-fatal errors**: the peripheral register block could not be opened or
//!   mapped. Privilege does not change while a process runs, so these end the session.
//! - **Caller errors**: an out-of-range pin or throttle value. These are reported
//!   before any register is touched and leave the session fully usable.
//! - **Calibration errors**: the busy-wait loop runs too fast or too slow for the
//!   timing profile (only raised when calibration is enforced).
//!
//! Nothing in this crate is retried automatically. A pulse burst that was cut short
//! cannot be resumed without producing a malformed frame.
//!
//! ```rust
//! use dshot_gpio::DshotError;
//!
//! let error = DshotError::invalid_pin(99);
//! assert!(!error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DSHOT operations.
pub type Result<T, E = DshotError> = std::result::Result<T, E>;

/// Main error type for DSHOT operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DshotError {
    #[error("Cannot open peripheral memory device {path}")]
    HardwareAccessDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mapping GPIO registers at physical offset {offset:#x} failed")]
    MappingFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("GPIO pin {pin} is outside the supported range 0..={max}")]
    InvalidPin { pin: u32, max: u8 },

    #[error("Throttle value {value} is outside the 11-bit range 0..={max}")]
    InvalidThrottle { value: u32, max: u16 },

    #[error("Busy-wait timing drifted {drift_percent:.1}% from nominal (tolerance {tolerance_percent:.1}%)")]
    TimingDrift { drift_percent: f64, tolerance_percent: f64 },

    #[error("Register index {index} is outside the {len}-word register window")]
    RegisterOutOfBounds { index: usize, len: usize },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Invalid configuration: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Blocking send task failed: {details}")]
    Task { details: String },
}

impl DshotError {
    /// Returns whether this error ends the session.
    ///
    /// Fatal errors come from peripheral setup. A host that gets one should stop
    /// sending and report the failure instead of opening a new session in a loop.
    pub fn is_fatal(&self) -> bool {
        match self {
            DshotError::HardwareAccessDenied { .. } => true,
            DshotError::MappingFailed { .. } => true,
            DshotError::UnsupportedPlatform { .. } => true,
            DshotError::TimingDrift { .. } => true,
            DshotError::InvalidPin { .. } => false,
            DshotError::InvalidThrottle { .. } => false,
            DshotError::RegisterOutOfBounds { .. } => false,
            DshotError::Config { .. } => false,
            DshotError::Task { .. } => false,
        }
    }

    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Always `false`. Setup failures stem from missing privilege, and a
    /// transmission cannot be replayed after partial execution.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DshotError::HardwareAccessDenied { .. } => vec![
                "Run the process as root or with CAP_SYS_RAWIO",
                "Check that /dev/mem exists and is not disabled by the kernel",
                "Verify the process is running on the target board",
            ],
            DshotError::MappingFailed { .. } => vec![
                "Check the configured board matches the hardware revision",
                "Verify the kernel permits /dev/mem mappings of peripheral memory",
            ],
            DshotError::InvalidPin { .. } => vec![
                "Use a GPIO pin number between 0 and 26",
                "Use BCM numbering, not physical header positions",
            ],
            DshotError::InvalidThrottle { .. } => vec![
                "Use a throttle value between 0 and 2047",
                "Values 0 to 47 are special commands; throttle starts at 48",
            ],
            DshotError::TimingDrift { .. } => vec![
                "Pin the CPU frequency (performance governor)",
                "Use a timing profile calibrated for this board",
                "Relax the calibration tolerance or switch the policy to warn",
            ],
            DshotError::RegisterOutOfBounds { .. } => vec![
                "Check register indices against the mapped block size",
            ],
            DshotError::UnsupportedPlatform { .. } => vec![
                "Run on a Linux single-board computer",
                "Use a MemoryRegisters window for off-target testing",
            ],
            DshotError::Config { .. } => vec![
                "Check the configuration field names and value ranges",
                "Remove overrides to fall back to the defaults",
            ],
            DshotError::Task { .. } => vec![
                "Check the tokio runtime is still running",
                "Inspect earlier log output for a panic inside the send",
            ],
        }
    }

    /// Helper constructor for device open failures.
    pub fn hardware_access_denied(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DshotError::HardwareAccessDenied { path: path.into(), source }
    }

    /// Helper constructor for rejected mappings.
    pub fn mapping_failed(offset: u64, source: std::io::Error) -> Self {
        DshotError::MappingFailed { offset, source }
    }

    /// Helper constructor for out-of-range pins.
    pub fn invalid_pin(pin: u32) -> Self {
        DshotError::InvalidPin { pin, max: crate::types::MAX_PIN }
    }

    /// Helper constructor for out-of-range throttle values.
    pub fn invalid_throttle(value: u32) -> Self {
        DshotError::InvalidThrottle { value, max: crate::types::MAX_THROTTLE }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        DshotError::Config { details: details.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_with_source(
        details: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DshotError::Config { details: details.into(), source: Some(source) }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        DshotError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<serde_yaml_ng::Error> for DshotError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        DshotError::config_with_source("YAML parse failure", Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            pin in 27u32..10_000,
            value in 2048u32..100_000,
            offset in 0u64..0xFFFF_FFFF,
            details in "[a-z ]{1,40}",
        ) {
            let pin_msg = DshotError::invalid_pin(pin).to_string();
            prop_assert!(pin_msg.contains(&pin.to_string()));
            prop_assert!(pin_msg.contains("26"));

            let throttle_msg = DshotError::invalid_throttle(value).to_string();
            prop_assert!(throttle_msg.contains(&value.to_string()));
            prop_assert!(throttle_msg.contains("2047"));

            let io_err = std::io::Error::other("mmap refused");
            let mapping_msg = DshotError::mapping_failed(offset, io_err).to_string();
            let hex = format!("{offset:#x}");
            prop_assert!(mapping_msg.contains(&hex));

            let config_msg = DshotError::config(details.clone()).to_string();
            prop_assert!(config_msg.contains(&details));
        }
    }

    #[test]
    fn setup_failures_are_fatal_and_caller_errors_are_not() {
        let denied = DshotError::hardware_access_denied(
            "/dev/mem",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let mapping = DshotError::mapping_failed(0x3F20_0000, std::io::Error::other("EINVAL"));

        assert!(denied.is_fatal());
        assert!(mapping.is_fatal());
        assert!(!DshotError::invalid_pin(99).is_fatal());
        assert!(!DshotError::invalid_throttle(4096).is_fatal());
    }

    #[test]
    fn nothing_is_retryable() {
        let errors = [
            DshotError::invalid_pin(30),
            DshotError::invalid_throttle(3000),
            DshotError::TimingDrift { drift_percent: 40.0, tolerance_percent: 10.0 },
            DshotError::mapping_failed(0, std::io::Error::other("nope")),
        ];
        for error in &errors {
            assert!(!error.is_retryable(), "{error} should not be retryable");
            assert!(!error.recovery_suggestions().is_empty());
        }
    }

    #[test]
    fn io_source_is_preserved() {
        let error = DshotError::hardware_access_denied(
            "/dev/mem",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
        );
        let source = std::error::Error::source(&error).expect("source should be chained");
        assert_eq!(source.to_string(), "no such device");
        assert!(error.to_string().contains("/dev/mem"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<DshotError>();

        let error = DshotError::invalid_pin(99);
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn yaml_errors_convert_to_config() {
        let err = serde_yaml_ng::from_str::<u32>("[not, a, number]").unwrap_err();
        let converted: DshotError = err.into();
        assert!(matches!(converted, DshotError::Config { source: Some(_), .. }));
    }
}
