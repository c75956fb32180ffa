//! DSHOT special commands (frame values 0-47)

use serde::{Deserialize, Serialize};

/// Special commands understood by BLHeli_32, BLHeli_S and KISS ESCs.
///
/// Commands are only acted on while the motor is stopped. Several of them
/// change persistent ESC settings and must be received six times in a row
/// before the ESC applies them; see [`Command::repeat_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[repr(u16)]
pub enum Command {
    MotorStop = 0,
    Beep1 = 1,
    Beep2 = 2,
    Beep3 = 3,
    Beep4 = 4,
    Beep5 = 5,
    EscInfo = 6,
    SpinDirection1 = 7,
    SpinDirection2 = 8,
    ThreeDModeOff = 9,
    ThreeDModeOn = 10,
    SettingsRequest = 11,
    SaveSettings = 12,
    ExtendedTelemetryEnable = 13,
    ExtendedTelemetryDisable = 14,
    /// Relative to the configured direction.
    SpinDirectionNormal = 20,
    SpinDirectionReversed = 21,
    Led0On = 22,
    Led1On = 23,
    Led2On = 24,
    Led3On = 25,
    Led0Off = 26,
    Led1Off = 27,
    Led2Off = 28,
    Led3Off = 29,
    AudioStreamModeToggle = 30,
    SilentModeToggle = 31,
    SignalLineTelemetryDisable = 32,
    SignalLineTelemetryEnable = 33,
    SignalLineContinuousErpmTelemetry = 34,
    SignalLineContinuousErpmPeriodTelemetry = 35,
    SignalLineTemperatureTelemetry = 42,
    SignalLineVoltageTelemetry = 43,
    SignalLineCurrentTelemetry = 44,
    SignalLineConsumptionTelemetry = 45,
    SignalLineErpmTelemetry = 46,
    SignalLineErpmPeriodTelemetry = 47,
}

impl Command {
    /// Frame value sent in the throttle field.
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Number of consecutive frames the ESC must see before acting.
    pub const fn repeat_count(self) -> usize {
        match self {
            Command::SpinDirection1
            | Command::SpinDirection2
            | Command::ThreeDModeOff
            | Command::ThreeDModeOn
            | Command::SaveSettings
            | Command::ExtendedTelemetryEnable
            | Command::ExtendedTelemetryDisable
            | Command::SpinDirectionNormal
            | Command::SpinDirectionReversed
            | Command::SignalLineTelemetryDisable
            | Command::SignalLineTelemetryEnable
            | Command::SignalLineContinuousErpmTelemetry
            | Command::SignalLineContinuousErpmPeriodTelemetry => 6,
            _ => 1,
        }
    }

    /// Look up a command by frame value. Unassigned values (15-19, 36-41) and
    /// throttle values (48 and up) return `None`.
    pub fn from_raw(value: u16) -> Option<Self> {
        let command = match value {
            0 => Command::MotorStop,
            1 => Command::Beep1,
            2 => Command::Beep2,
            3 => Command::Beep3,
            4 => Command::Beep4,
            5 => Command::Beep5,
            6 => Command::EscInfo,
            7 => Command::SpinDirection1,
            8 => Command::SpinDirection2,
            9 => Command::ThreeDModeOff,
            10 => Command::ThreeDModeOn,
            11 => Command::SettingsRequest,
            12 => Command::SaveSettings,
            13 => Command::ExtendedTelemetryEnable,
            14 => Command::ExtendedTelemetryDisable,
            20 => Command::SpinDirectionNormal,
            21 => Command::SpinDirectionReversed,
            22 => Command::Led0On,
            23 => Command::Led1On,
            24 => Command::Led2On,
            25 => Command::Led3On,
            26 => Command::Led0Off,
            27 => Command::Led1Off,
            28 => Command::Led2Off,
            29 => Command::Led3Off,
            30 => Command::AudioStreamModeToggle,
            31 => Command::SilentModeToggle,
            32 => Command::SignalLineTelemetryDisable,
            33 => Command::SignalLineTelemetryEnable,
            34 => Command::SignalLineContinuousErpmTelemetry,
            35 => Command::SignalLineContinuousErpmPeriodTelemetry,
            42 => Command::SignalLineTemperatureTelemetry,
            43 => Command::SignalLineVoltageTelemetry,
            44 => Command::SignalLineCurrentTelemetry,
            45 => Command::SignalLineConsumptionTelemetry,
            46 => Command::SignalLineErpmTelemetry,
            47 => Command::SignalLineErpmPeriodTelemetry,
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip_through_lookup() {
        for value in 0..48u16 {
            if let Some(command) = Command::from_raw(value) {
                assert_eq!(command.value(), value);
            }
        }
    }

    #[test]
    fn unassigned_and_throttle_values_are_not_commands() {
        for value in (15..20).chain(36..42).chain([48, 1000, 2047]) {
            assert_eq!(Command::from_raw(value), None, "value {value}");
        }
    }

    #[test]
    fn settings_changes_need_six_frames() {
        assert_eq!(Command::SaveSettings.repeat_count(), 6);
        assert_eq!(Command::SpinDirectionReversed.repeat_count(), 6);
        assert_eq!(Command::Beep1.repeat_count(), 1);
        assert_eq!(Command::MotorStop.repeat_count(), 1);
    }
}
