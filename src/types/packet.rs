//! DSHOT packet encoding
//!
//! A DSHOT frame is sixteen bits, sent most-significant bit first:
//!
//! ```text
//!  15                    5    4     3       0
//! [ 11-bit throttle      ][ T ][ checksum  ]
//! ```
//!
//! The checksum is the XOR of the three nibbles of the 12-bit
//! throttle+telemetry payload.

use super::command::Command;
use crate::{DshotError, Result};

/// Largest value that fits the 11-bit throttle field.
pub const MAX_THROTTLE: u16 = 2047;

/// Lowest value interpreted as throttle; 0..=47 are special commands.
pub const MIN_THROTTLE: u16 = 48;

/// Compute the 4-bit checksum of a 12-bit throttle+telemetry payload.
#[inline]
pub const fn checksum(payload: u16) -> u16 {
    (payload ^ (payload >> 4) ^ (payload >> 8)) & 0x0f
}

/// Encode a throttle value and telemetry flag into a 16-bit wire packet.
///
/// Throttle values above [`MAX_THROTTLE`] are rejected with
/// [`DshotError::InvalidThrottle`] rather than truncated, since masking would
/// silently send a different motor speed.
///
/// ```rust
/// use dshot_gpio::types::encode;
///
/// assert_eq!(encode(0, false).unwrap(), 0x0000);
/// assert_eq!(encode(2047, true).unwrap(), 0xFFFF);
/// assert!(encode(2048, false).is_err());
/// ```
pub fn encode(throttle: u16, telemetry: bool) -> Result<u16> {
    Ok(ThrottlePacket::new(throttle, telemetry)?.encode().raw())
}

/// An 11-bit throttle value plus the telemetry request flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThrottlePacket {
    throttle: u16,
    telemetry: bool,
}

impl ThrottlePacket {
    /// Create a packet, rejecting throttle values that do not fit 11 bits.
    pub fn new(throttle: u16, telemetry: bool) -> Result<Self> {
        if throttle > MAX_THROTTLE {
            return Err(DshotError::invalid_throttle(u32::from(throttle)));
        }
        Ok(Self { throttle, telemetry })
    }

    /// Packet carrying a special command.
    ///
    /// The telemetry bit is always set: ESCs ignore command frames without it.
    pub fn from_command(command: Command) -> Self {
        Self { throttle: command.value(), telemetry: true }
    }

    /// Map a fraction of full power onto the throttle range 48..=2047.
    ///
    /// The input is clamped to `0.0..=1.0` (NaN counts as 0.0), so the result is
    /// always a throttle value and never a special command.
    pub fn from_fraction(fraction: f32) -> Self {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let span = f32::from(MAX_THROTTLE - MIN_THROTTLE);
        let throttle = MIN_THROTTLE + (fraction * span).round() as u16;
        Self { throttle, telemetry: false }
    }

    /// Raw 11-bit value.
    pub fn throttle(&self) -> u16 {
        self.throttle
    }

    /// Whether the packet asks the ESC for telemetry.
    pub fn telemetry(&self) -> bool {
        self.telemetry
    }

    /// Whether the value falls in the special-command range.
    pub fn is_command(&self) -> bool {
        self.throttle < MIN_THROTTLE
    }

    /// Build the wire packet. The checksum is computed on every call.
    pub fn encode(&self) -> WirePacket {
        let payload = (self.throttle << 1) | u16::from(self.telemetry);
        WirePacket((payload << 4) | checksum(payload))
    }
}

/// The 16-bit value shifted out on the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WirePacket(pub u16);

impl WirePacket {
    /// Number of bits in a frame.
    pub const BITS: u32 = 16;

    /// Raw 16-bit frame.
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// The 12-bit throttle+telemetry payload.
    pub fn payload(&self) -> u16 {
        self.0 >> 4
    }

    /// Checksum carried in the low nibble.
    pub fn checksum(&self) -> u16 {
        self.0 & 0x0f
    }

    /// Whether the carried checksum matches the payload.
    pub fn is_valid(&self) -> bool {
        checksum(self.payload()) == self.checksum()
    }

    /// Recover the throttle packet, or `None` when the checksum does not match.
    pub fn decode(&self) -> Option<ThrottlePacket> {
        if !self.is_valid() {
            return None;
        }
        let payload = self.payload();
        Some(ThrottlePacket { throttle: payload >> 1, telemetry: payload & 1 == 1 })
    }

    /// Bits in transmission order, most significant first.
    pub fn bits(&self) -> impl Iterator<Item = bool> {
        let raw = self.0;
        (0..Self::BITS).rev().map(move |i| (raw >> i) & 1 == 1)
    }
}

impl From<ThrottlePacket> for WirePacket {
    fn from(packet: ThrottlePacket) -> Self {
        packet.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_throttle_encodes_to_zero() {
        assert_eq!(encode(0, false).unwrap(), 0x0000);
    }

    #[test]
    fn full_throttle_with_telemetry_encodes_to_all_ones() {
        // payload 0xFFF, nibbles F ^ F ^ F = F
        assert_eq!(encode(2047, true).unwrap(), 0xFFFF);
    }

    #[test]
    fn known_frames() {
        // 48 = disarmed idle: payload 0x060, checksum 0 ^ 6 ^ 0 = 6
        assert_eq!(encode(48, false).unwrap(), 0x0606);
        // 1046 with telemetry: payload 0x82D, checksum D ^ 2 ^ 8 = 7
        assert_eq!(encode(1046, true).unwrap(), 0x82D7);
    }

    #[test]
    fn out_of_range_throttle_is_rejected() {
        let err = ThrottlePacket::new(2048, false).unwrap_err();
        assert!(matches!(err, DshotError::InvalidThrottle { value: 2048, max: 2047 }));
        assert!(encode(u16::MAX, true).is_err());
    }

    #[test]
    fn commands_carry_telemetry_bit() {
        let packet = ThrottlePacket::from_command(Command::SpinDirectionReversed);
        assert_eq!(packet.throttle(), 21);
        assert!(packet.telemetry());
        assert!(packet.is_command());
    }

    #[test]
    fn fraction_maps_onto_throttle_range() {
        assert_eq!(ThrottlePacket::from_fraction(0.0).throttle(), MIN_THROTTLE);
        assert_eq!(ThrottlePacket::from_fraction(1.0).throttle(), MAX_THROTTLE);
        assert_eq!(ThrottlePacket::from_fraction(-3.0).throttle(), MIN_THROTTLE);
        assert_eq!(ThrottlePacket::from_fraction(7.5).throttle(), MAX_THROTTLE);
        assert_eq!(ThrottlePacket::from_fraction(f32::NAN).throttle(), MIN_THROTTLE);
        assert!(!ThrottlePacket::from_fraction(0.0).is_command());
    }

    #[test]
    fn corrupted_checksum_does_not_decode() {
        let wire = ThrottlePacket::new(1000, false).unwrap().encode();
        let corrupted = WirePacket(wire.raw() ^ 0x0001);
        assert!(!corrupted.is_valid());
        assert_eq!(corrupted.decode(), None);
    }

    #[test]
    fn bits_are_msb_first() {
        let bits: Vec<bool> = WirePacket(0x8000).bits().collect();
        assert_eq!(bits.len(), 16);
        assert!(bits[0]);
        assert!(bits[1..].iter().all(|b| !b));
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic(throttle in 0u16..=2047, telemetry in any::<bool>()) {
            let first = encode(throttle, telemetry).unwrap();
            let second = encode(throttle, telemetry).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn decoded_packets_match_their_checksum(throttle in 0u16..=2047, telemetry in any::<bool>()) {
            let packet = ThrottlePacket::new(throttle, telemetry).unwrap();
            let wire = packet.encode();

            let payload = wire.raw() >> 4;
            let recomputed = (payload ^ (payload >> 4) ^ (payload >> 8)) & 0xf;
            prop_assert_eq!(recomputed, wire.raw() & 0xf);
            prop_assert_eq!(wire.decode(), Some(packet));
        }

        #[test]
        fn single_bit_payload_errors_are_detected(
            throttle in 0u16..=2047,
            telemetry in any::<bool>(),
            flip in 4u32..16,
        ) {
            let wire = ThrottlePacket::new(throttle, telemetry).unwrap().encode();
            let corrupted = WirePacket(wire.raw() ^ (1 << flip));
            prop_assert!(!corrupted.is_valid());
        }
    }
}
