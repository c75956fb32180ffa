//! Pulse transmitter
//!
//! Shifts a [`WirePacket`] out on one pin, most significant bit first. Every bit
//! is a high phase followed by a low phase; a 1 bit stays high for `t1h` cycles,
//! a 0 bit for `t0h`. The sixteen bits go out as one burst with no logging,
//! allocation or syscalls in between, since the receiver resynchronises only on
//! the gap between frames.

use crate::gpio::{self, GPCLR0};
use crate::timer::CycleDelay;
use crate::types::{GpioPin, TimingProfile, WirePacket};
use crate::window::{RegisterWindow, check_index};
use crate::Result;

/// Emit one DSHOT frame on `pin`.
///
/// Register bounds are checked before the first edge, so a short window fails
/// without emitting a partial frame.
#[inline]
pub fn transmit<W, D>(
    window: &mut W,
    pin: GpioPin,
    packet: WirePacket,
    profile: &TimingProfile,
    delay: &mut D,
) -> Result<()>
where
    W: RegisterWindow,
    D: CycleDelay,
{
    check_index(GPCLR0, window.len())?;

    for bit in packet.bits() {
        let (high, low) = profile.phases(bit);
        gpio::set(window, pin)?;
        delay.wait_cycles(high);
        gpio::clear(window, pin)?;
        delay.wait_cycles(low);
    }

    Ok(())
}

/// One transmitted bit as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// Long high phase: a 1 bit.
    High,
    /// Short high phase: a 0 bit.
    Low,
}

/// A [`CycleDelay`] that records requested waits instead of spinning.
///
/// Useful for dry runs and for checking what a burst would look like.
#[derive(Debug, Clone, Default)]
pub struct PulseRecorder {
    waits: Vec<u32>,
}

impl PulseRecorder {
    pub fn new() -> Self {
        Self { waits: Vec::with_capacity(2 * WirePacket::BITS as usize) }
    }

    /// Every requested wait, in order.
    pub fn waits(&self) -> &[u32] {
        &self.waits
    }

    /// Total cycles that would have been spent spinning.
    pub fn total_cycles(&self) -> u64 {
        self.waits.iter().map(|&w| u64::from(w)).sum()
    }

    /// Classify recorded waits as pulses under `profile`.
    ///
    /// Returns `None` when the waits do not pair up into known bit shapes.
    pub fn pulses(&self, profile: &TimingProfile) -> Option<Vec<Pulse>> {
        if self.waits.len() % 2 != 0 {
            return None;
        }
        self.waits
            .chunks_exact(2)
            .map(|phase| match (phase[0], phase[1]) {
                (h, l) if (h, l) == profile.phases(true) => Some(Pulse::High),
                (h, l) if (h, l) == profile.phases(false) => Some(Pulse::Low),
                _ => None,
            })
            .collect()
    }

    /// Reassemble recorded frames (sixteen pulses each) into wire packets.
    pub fn frames(&self, profile: &TimingProfile) -> Option<Vec<WirePacket>> {
        let pulses = self.pulses(profile)?;
        if pulses.len() % WirePacket::BITS as usize != 0 {
            return None;
        }
        let frames = pulses
            .chunks_exact(WirePacket::BITS as usize)
            .map(|bits| {
                WirePacket(bits.iter().fold(0u16, |acc, p| (acc << 1) | u16::from(*p == Pulse::High)))
            })
            .collect();
        Some(frames)
    }

    /// Forget recorded waits.
    pub fn clear(&mut self) {
        self.waits.clear();
    }
}

impl CycleDelay for PulseRecorder {
    fn wait_cycles(&mut self, cycles: u32) {
        self.waits.push(cycles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::GPSET0;
    use crate::types::ThrottlePacket;
    use crate::window::MemoryRegisters;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Edge {
        Rise(u32),
        Fall(u32),
        Wait(u32),
    }

    /// Logic-analyser stand-in: logs register edges and waits on one timeline.
    #[derive(Clone, Default)]
    struct Scope {
        events: Rc<RefCell<Vec<Edge>>>,
    }

    impl RegisterWindow for Scope {
        fn len(&self) -> usize {
            crate::peripheral::BLOCK_WORDS
        }

        fn read(&self, _index: usize) -> Result<u32> {
            Ok(0)
        }

        fn write(&mut self, index: usize, value: u32) -> Result<()> {
            let edge = match index {
                GPSET0 => Edge::Rise(value),
                GPCLR0 => Edge::Fall(value),
                other => panic!("unexpected register write to {other}"),
            };
            self.events.borrow_mut().push(edge);
            Ok(())
        }
    }

    impl CycleDelay for Scope {
        fn wait_cycles(&mut self, cycles: u32) {
            self.events.borrow_mut().push(Edge::Wait(cycles));
        }
    }

    fn pin(n: u32) -> GpioPin {
        GpioPin::new(n).unwrap()
    }

    const PROFILE: TimingProfile = TimingProfile::DSHOT150;

    #[test]
    fn every_bit_is_rise_wait_fall_wait() {
        let mut window = Scope::default();
        let mut delay = window.clone();
        transmit(&mut window, pin(5), WirePacket(0x8001), &PROFILE, &mut delay).unwrap();

        let events = window.events.borrow();
        assert_eq!(events.len(), 64);
        for (i, bit) in events.chunks_exact(4).enumerate() {
            let one = i == 0 || i == 15;
            let (high, low) = PROFILE.phases(one);
            assert_eq!(
                bit,
                &[Edge::Rise(1 << 5), Edge::Wait(high), Edge::Fall(1 << 5), Edge::Wait(low)],
                "bit {i}"
            );
        }
    }

    #[test]
    fn msb_only_packet_is_one_high_then_fifteen_low() {
        let mut window = MemoryRegisters::gpio_block();
        let mut recorder = PulseRecorder::new();
        transmit(&mut window, pin(7), WirePacket(0x8000), &PROFILE, &mut recorder).unwrap();

        let pulses = recorder.pulses(&PROFILE).unwrap();
        assert_eq!(pulses.len(), 16);
        assert_eq!(pulses[0], Pulse::High);
        assert!(pulses[1..].iter().all(|p| *p == Pulse::Low));
    }

    #[test]
    fn extreme_packets_still_emit_sixteen_pulses() {
        for raw in [0x0000, 0xFFFF] {
            let mut window = MemoryRegisters::gpio_block();
            let mut recorder = PulseRecorder::new();
            transmit(&mut window, pin(20), WirePacket(raw), &PROFILE, &mut recorder).unwrap();

            assert_eq!(window.writes_to(GPSET0).count(), 16);
            assert_eq!(window.writes_to(GPCLR0).count(), 16);
            assert_eq!(recorder.frames(&PROFILE).unwrap(), vec![WirePacket(raw)]);
        }
    }

    #[test]
    fn short_window_fails_before_first_edge() {
        let mut window = MemoryRegisters::new(GPCLR0);
        let mut recorder = PulseRecorder::new();
        let result = transmit(&mut window, pin(3), WirePacket(0xFFFF), &PROFILE, &mut recorder);

        assert!(result.is_err());
        assert!(window.is_untouched());
        assert!(recorder.waits().is_empty());
    }

    #[test]
    fn recorder_rejects_unknown_shapes() {
        let mut recorder = PulseRecorder::new();
        recorder.wait_cycles(1);
        recorder.wait_cycles(2);
        assert_eq!(recorder.pulses(&PROFILE), None);
        recorder.clear();
        recorder.wait_cycles(PROFILE.t1h);
        assert_eq!(recorder.pulses(&PROFILE), None);
    }

    proptest! {
        #[test]
        fn every_packet_is_sixteen_pulses_in_order(raw in any::<u16>(), n in 0u32..=26) {
            let mut window = MemoryRegisters::gpio_block();
            let mut recorder = PulseRecorder::new();
            transmit(&mut window, pin(n), WirePacket(raw), &PROFILE, &mut recorder).unwrap();

            prop_assert_eq!(recorder.waits().len(), 32);
            prop_assert_eq!(recorder.frames(&PROFILE), Some(vec![WirePacket(raw)]));
            prop_assert_eq!(recorder.total_cycles(), PROFILE.frame_cycles(WirePacket(raw)));
            prop_assert!(window.writes().iter().all(|w| w.value == 1 << n));
            prop_assert_eq!(window.read_count(), 0);
        }

        #[test]
        fn encoded_throttle_survives_the_wire(throttle in 0u16..=2047, telemetry in any::<bool>()) {
            let packet = ThrottlePacket::new(throttle, telemetry).unwrap();
            let mut window = MemoryRegisters::gpio_block();
            let mut recorder = PulseRecorder::new();
            transmit(&mut window, pin(19), packet.encode(), &PROFILE, &mut recorder).unwrap();

            let frames = recorder.frames(&PROFILE).unwrap();
            prop_assert_eq!(frames.len(), 1);
            prop_assert_eq!(frames[0].decode(), Some(packet));
        }
    }
}
