//! Session configuration
//!
//! The crate never reads configuration files itself. Hosts that keep settings on
//! disk hand the text to [`SessionConfig::from_yaml_str`]:
//!
//! ```rust
//! use dshot_gpio::{Board, CalibrationPolicy, SessionConfig};
//!
//! let config = SessionConfig::from_yaml_str(
//!     "board: bcm2711\ncalibration: warn\ntolerance_percent: 8.0\n",
//! ).unwrap();
//! assert_eq!(config.board, Board::Bcm2711);
//! assert_eq!(config.calibration, CalibrationPolicy::Warn);
//! ```

use serde::{Deserialize, Serialize};

use super::timing::TimingProfile;
use crate::timer::{SPIN_LOOP, SpinLoop};
use crate::{DshotError, Result};

/// Offset of the GPIO controller from the peripheral base.
pub const GPIO_OFFSET: u64 = 0x0020_0000;

/// Raspberry Pi SoC family, which fixes the physical peripheral base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum Board {
    /// Pi 1, Zero, Zero W.
    Bcm2835,
    /// Pi 2, Pi 3, Zero 2 W.
    #[default]
    Bcm2837,
    /// Pi 4, Pi 400, CM4.
    Bcm2711,
}

impl Board {
    /// Physical address of the peripheral window as seen by the ARM cores.
    pub const fn peripheral_base(self) -> u64 {
        match self {
            Board::Bcm2835 => 0x2000_0000,
            Board::Bcm2837 => 0x3F00_0000,
            Board::Bcm2711 => 0xFE00_0000,
        }
    }

    /// Physical address of the GPIO register block.
    pub const fn gpio_base(self) -> u64 {
        self.peripheral_base() + GPIO_OFFSET
    }
}

/// What to do when the busy-wait loop does not match the timing profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPolicy {
    /// Trust the profile without measuring.
    #[default]
    Skip,
    /// Measure and log a warning when drift exceeds the tolerance.
    Warn,
    /// Measure and refuse to open the session on excessive drift.
    Enforce,
    /// Measure and replace the profile with one derived from the measurement.
    Adapt,
}

impl CalibrationPolicy {
    /// Default policy for `spin`: the stock profile is trusted only on the loop
    /// it was tuned with, anywhere else drift is measured and logged.
    pub const fn for_spin_loop(spin: SpinLoop) -> Self {
        if spin.matches_default_profile() { CalibrationPolicy::Skip } else { CalibrationPolicy::Warn }
    }
}

/// Everything a [`crate::Session`] needs besides its register window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub board: Board,
    pub timing: TimingProfile,
    pub calibration: CalibrationPolicy,
    /// Largest acceptable relative drift of any pulse phase, in percent.
    pub tolerance_percent: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board: Board::default(),
            timing: TimingProfile::DSHOT150,
            calibration: CalibrationPolicy::for_spin_loop(SPIN_LOOP),
            tolerance_percent: 10.0,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        if !self.tolerance_percent.is_finite() || self.tolerance_percent <= 0.0 {
            return Err(DshotError::config(format!(
                "tolerance_percent must be a positive number, got {}",
                self.tolerance_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_the_pi_3() {
        let config = SessionConfig::default();
        assert_eq!(config.board.gpio_base(), 0x3F20_0000);
        assert_eq!(config.timing, TimingProfile::DSHOT150);
        assert_eq!(config.calibration, CalibrationPolicy::for_spin_loop(SPIN_LOOP));
    }

    #[test]
    fn board_bases() {
        assert_eq!(Board::Bcm2835.gpio_base(), 0x2020_0000);
        assert_eq!(Board::Bcm2711.gpio_base(), 0xFE20_0000);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn timing_override_is_parsed() {
        let yaml = "timing:\n  t1h: 600\n  t1l: 200\n  t0h: 300\n  t0l: 500\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.timing, TimingProfile { t1h: 600, t1l: 200, t0h: 300, t0l: 500 });
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(matches!(
            SessionConfig::from_yaml_str("pins: [5, 7]\n"),
            Err(DshotError::Config { .. })
        ));
        assert!(SessionConfig::from_yaml_str("tolerance_percent: -1.0\n").is_err());
        assert!(SessionConfig::from_yaml_str("board: bcm9999\n").is_err());
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let config = SessionConfig {
            board: Board::Bcm2835,
            calibration: CalibrationPolicy::Enforce,
            ..SessionConfig::default()
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
