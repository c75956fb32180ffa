//! Busy-wait cycle timer
//!
//! [`wait_cycles`] is the only timing primitive used during a pulse burst. It
//! spins on a counter with no syscalls, no allocation and no yielding. Its
//! durations are only as good as the calibration of the [`TimingProfile`] in
//! use: CPU frequency scaling, a different SoC or a different loop body all
//! change how long one iteration takes.
//!
//! On ARM the loop is a two-instruction `subs`/`bne` sequence on a register,
//! which is what [`TimingProfile::DSHOT150`] was tuned against. Other targets
//! fall back to a portable counter hidden from the optimizer with
//! [`std::hint::black_box`], which costs several times more per iteration; see
//! [`SPIN_LOOP`].
//!
//! [`Calibration`] measures the loop against the monotonic clock once, outside
//! any burst, so drift can be reported (or corrected) before motors are driven.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::types::{
    CalibrationPolicy, DSHOT150_BIT_NS, DSHOT150_T0H_NS, DSHOT150_T1H_NS, TimingProfile,
};
use crate::{DshotError, Result};

/// Instruction sequence behind [`wait_cycles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinLoop {
    /// Register decrement and branch; one iteration is two instructions.
    Register,
    /// Counter passed through [`std::hint::black_box`] on every iteration.
    Opaque,
}

impl SpinLoop {
    /// Whether [`TimingProfile::DSHOT150`] was measured with this loop.
    pub const fn matches_default_profile(self) -> bool {
        matches!(self, SpinLoop::Register)
    }
}

/// The loop compiled into [`wait_cycles`] on this target.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
pub const SPIN_LOOP: SpinLoop = SpinLoop::Register;

/// The loop compiled into [`wait_cycles`] on this target.
#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
pub const SPIN_LOOP: SpinLoop = SpinLoop::Opaque;

/// Spin for approximately `cycles` loop iterations.
#[inline(never)]
pub fn wait_cycles(cycles: u32) {
    // The register loop decrements before testing, so zero would wrap.
    if cycles == 0 {
        return;
    }
    spin(cycles);
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn spin(cycles: u32) {
    // SAFETY: only the counter register and the condition flags are touched.
    unsafe {
        std::arch::asm!(
            "2:",
            "subs {n:w}, {n:w}, #1",
            "b.ne 2b",
            n = inout(reg) cycles => _,
            options(nomem, nostack),
        );
    }
}

#[cfg(target_arch = "arm")]
#[inline(always)]
fn spin(cycles: u32) {
    // SAFETY: only the counter register and the condition flags are touched.
    unsafe {
        std::arch::asm!(
            "2:",
            "subs {n}, {n}, #1",
            "bne 2b",
            n = inout(reg) cycles => _,
            options(nomem, nostack),
        );
    }
}

#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
#[inline(always)]
fn spin(cycles: u32) {
    let mut remaining = cycles;
    while remaining != 0 {
        remaining = std::hint::black_box(remaining) - 1;
    }
}

/// Something that can hold the calling thread for a number of cycles.
///
/// The pulse transmitter is generic over this so bursts can be inspected
/// without real waiting.
pub trait CycleDelay {
    fn wait_cycles(&mut self, cycles: u32);
}

/// The hardware delay: spins with [`wait_cycles`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyWait;

impl CycleDelay for BusyWait {
    #[inline(always)]
    fn wait_cycles(&mut self, cycles: u32) {
        wait_cycles(cycles);
    }
}

impl<D: CycleDelay + ?Sized> CycleDelay for &mut D {
    fn wait_cycles(&mut self, cycles: u32) {
        (**self).wait_cycles(cycles);
    }
}

/// Iterations per measurement sample.
const CALIBRATION_ITERATIONS: u32 = 2_000_000;
/// Samples per measurement; the fastest wins since preemption only adds time.
const CALIBRATION_SAMPLES: usize = 5;

/// Measured cost of one [`wait_cycles`] iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    ns_per_cycle: f64,
}

/// Durations a profile produces under a given calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReport {
    pub t1h_ns: f64,
    pub t0h_ns: f64,
    pub one_period_ns: f64,
    pub zero_period_ns: f64,
    /// Largest relative deviation from DSHOT150 nominal, in percent.
    pub drift_percent: f64,
}

impl CalibrationReport {
    /// Whether every phase is within `tolerance_percent` of nominal.
    pub fn within(&self, tolerance_percent: f64) -> bool {
        self.drift_percent <= tolerance_percent
    }
}

impl Calibration {
    /// Time the busy-wait loop against the monotonic clock.
    ///
    /// Takes a few milliseconds. Never call this while a burst is in flight.
    pub fn measure() -> Self {
        Self::measure_with(CALIBRATION_ITERATIONS, CALIBRATION_SAMPLES)
    }

    /// Measure with explicit sample size.
    pub fn measure_with(iterations: u32, samples: usize) -> Self {
        let iterations = iterations.max(1);
        wait_cycles(iterations / 4);

        let fastest = (0..samples.max(1))
            .map(|_| {
                let start = Instant::now();
                wait_cycles(iterations);
                start.elapsed()
            })
            .min()
            .unwrap_or(Duration::ZERO);

        let calibration = Self::from_ns_per_cycle(fastest.as_nanos() as f64 / iterations as f64);
        debug!(ns_per_cycle = calibration.ns_per_cycle, iterations, samples, "Measured busy-wait loop");
        calibration
    }

    /// Calibration with a known iteration cost.
    pub fn from_ns_per_cycle(ns_per_cycle: f64) -> Self {
        Self { ns_per_cycle }
    }

    /// Nanoseconds per loop iteration.
    pub fn ns_per_cycle(&self) -> f64 {
        self.ns_per_cycle
    }

    /// Wall-clock duration of `cycles` iterations.
    pub fn duration_ns(&self, cycles: u64) -> f64 {
        cycles as f64 * self.ns_per_cycle
    }

    /// Whether the measured iteration cost is usable.
    pub fn is_valid(&self) -> bool {
        self.ns_per_cycle.is_finite() && self.ns_per_cycle > 0.0
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DshotError::config(format!(
                "busy-wait calibration of {} ns per cycle is unusable",
                self.ns_per_cycle
            )))
        }
    }

    /// Compare what `profile` produces against DSHOT150 nominal timing.
    ///
    /// An unusable calibration (zero, negative or NaN cost) reports infinite drift.
    pub fn check(&self, profile: &TimingProfile) -> CalibrationReport {
        let t1h_ns = self.duration_ns(u64::from(profile.t1h));
        let t0h_ns = self.duration_ns(u64::from(profile.t0h));
        let one_period_ns = self.duration_ns(profile.one_period());
        let zero_period_ns = self.duration_ns(profile.zero_period());

        let drift_percent = if !self.is_valid() {
            f64::INFINITY
        } else {
            [
            (t1h_ns, DSHOT150_T1H_NS),
            (t0h_ns, DSHOT150_T0H_NS),
            (one_period_ns, DSHOT150_BIT_NS),
            (zero_period_ns, DSHOT150_BIT_NS),
        ]
        .iter()
            .map(|(actual, nominal)| ((actual - nominal) / nominal).abs() * 100.0)
            .fold(0.0, f64::max)
        };

        CalibrationReport { t1h_ns, t0h_ns, one_period_ns, zero_period_ns, drift_percent }
    }

    /// Profile hitting DSHOT150 nominal timing under this calibration.
    pub fn derive_profile(&self) -> Result<TimingProfile> {
        self.ensure_valid()?;
        let cycles = |ns: f64| (ns / self.ns_per_cycle).round().clamp(1.0, u32::MAX as f64) as u32;
        let period = cycles(DSHOT150_BIT_NS);
        let t1h = cycles(DSHOT150_T1H_NS);
        let t0h = cycles(DSHOT150_T0H_NS);
        let profile = TimingProfile {
            t1h,
            t1l: period.saturating_sub(t1h).max(1),
            t0h,
            t0l: period.saturating_sub(t0h).max(1),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Apply `policy` to `profile`, returning the profile the session should use.
    pub fn apply(
        &self,
        policy: CalibrationPolicy,
        profile: TimingProfile,
        tolerance_percent: f64,
    ) -> Result<TimingProfile> {
        if policy == CalibrationPolicy::Skip {
            return Ok(profile);
        }
        self.ensure_valid()?;
        let report = self.check(&profile);
        match policy {
            CalibrationPolicy::Skip => Ok(profile),
            CalibrationPolicy::Warn => {
                if !report.within(tolerance_percent) {
                    warn!(
                        drift_percent = report.drift_percent,
                        tolerance_percent,
                        t1h_ns = report.t1h_ns,
                        t0h_ns = report.t0h_ns,
                        "Busy-wait timing outside DSHOT150 tolerance"
                    );
                }
                Ok(profile)
            }
            CalibrationPolicy::Enforce => {
                if report.within(tolerance_percent) {
                    Ok(profile)
                } else {
                    Err(DshotError::TimingDrift {
                        drift_percent: report.drift_percent,
                        tolerance_percent,
                    })
                }
            }
            CalibrationPolicy::Adapt => {
                let derived = self.derive_profile()?;
                debug!(?derived, drift_percent = report.drift_percent, "Derived timing profile");
                Ok(derived)
            }
        }
    }
}
