//! Pulse-width timing profiles

use serde::{Deserialize, Serialize};

use super::packet::WirePacket;
use crate::{DshotError, Result};

/// Nominal DSHOT150 bit period in nanoseconds (150 kbit/s).
pub const DSHOT150_BIT_NS: f64 = 1_000_000.0 / 150.0;

/// Nominal DSHOT150 high time of a 1 bit (75% duty).
pub const DSHOT150_T1H_NS: f64 = DSHOT150_BIT_NS * 0.75;

/// Nominal DSHOT150 high time of a 0 bit (37.5% duty).
pub const DSHOT150_T0H_NS: f64 = DSHOT150_BIT_NS * 0.375;

/// Busy-wait cycle counts for the four pulse phases.
///
/// Values are loop iterations of [`crate::timer::wait_cycles`], not wall-clock
/// time, so a profile is only correct for the CPU it was tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TimingProfile {
    /// High phase of a 1 bit.
    pub t1h: u32,
    /// Low phase of a 1 bit.
    pub t1l: u32,
    /// High phase of a 0 bit.
    pub t0h: u32,
    /// Low phase of a 0 bit.
    pub t0l: u32,
}

impl TimingProfile {
    /// DSHOT150 on a BCM2837 (Raspberry Pi 3) at its stock 1.2 GHz clock,
    /// tuned against a logic analyser.
    pub const DSHOT150: Self = Self { t1h: 5857, t1l: 1861, t0h: 2848, t0l: 4870 };

    /// High and low cycle counts for one bit.
    #[inline(always)]
    pub fn phases(&self, bit: bool) -> (u32, u32) {
        if bit { (self.t1h, self.t1l) } else { (self.t0h, self.t0l) }
    }

    /// Total cycles of a 1 bit.
    pub fn one_period(&self) -> u64 {
        u64::from(self.t1h) + u64::from(self.t1l)
    }

    /// Total cycles of a 0 bit.
    pub fn zero_period(&self) -> u64 {
        u64::from(self.t0h) + u64::from(self.t0l)
    }

    /// Busy-wait cycles spent transmitting a frame.
    pub fn frame_cycles(&self, packet: WirePacket) -> u64 {
        let ones = u64::from(packet.raw().count_ones());
        let zeros = u64::from(WirePacket::BITS) - ones;
        ones * self.one_period() + zeros * self.zero_period()
    }

    /// Reject profiles a receiver could not tell apart.
    ///
    /// Every phase must be non-zero and a 1 bit must stay high longer than a 0 bit.
    pub fn validate(&self) -> Result<()> {
        if self.t1h == 0 || self.t1l == 0 || self.t0h == 0 || self.t0l == 0 {
            return Err(DshotError::config(format!("timing phases must be non-zero: {self:?}")));
        }
        if self.t1h <= self.t0h {
            return Err(DshotError::config(format!(
                "t1h ({}) must exceed t0h ({})",
                self.t1h, self.t0h
            )));
        }
        Ok(())
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::DSHOT150
    }
}
