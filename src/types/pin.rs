//! GPIO pin numbers

use std::fmt;

use crate::{DshotError, Result};

/// Highest BCM GPIO number exposed on the 40-pin header.
pub const MAX_PIN: u8 = 26;

/// Number of pins a session tracks.
pub const NUM_PINS: usize = MAX_PIN as usize + 1;

/// A BCM GPIO pin number, validated to lie in `0..=26`.
///
/// Holding a `GpioPin` means the range check already happened, so register
/// offsets derived from it are always inside the GPIO block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpioPin(u8);

impl GpioPin {
    /// Validate a raw pin number.
    pub fn new(pin: u32) -> Result<Self> {
        if pin <= u32::from(MAX_PIN) {
            Ok(Self(pin as u8))
        } else {
            Err(DshotError::invalid_pin(pin))
        }
    }

    /// BCM pin number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// Index into per-pin tables.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Single-bit mask for the set, clear and level registers.
    pub fn mask(self) -> u32 {
        1 << self.0
    }

    /// Function-select register holding this pin's 3-bit field.
    pub fn function_select_register(self) -> usize {
        usize::from(self.0 / 10)
    }

    /// Bit offset of this pin's field inside its function-select register.
    pub fn function_select_shift(self) -> u32 {
        u32::from(self.0 % 10) * 3
    }

    /// Every supported pin in ascending order.
    pub fn all() -> impl Iterator<Item = GpioPin> {
        (0..=MAX_PIN).map(GpioPin)
    }
}

impl TryFrom<u32> for GpioPin {
    type Error = DshotError;

    fn try_from(pin: u32) -> Result<Self> {
        GpioPin::new(pin)
    }
}

impl From<GpioPin> for u32 {
    fn from(pin: GpioPin) -> Self {
        u32::from(pin.0)
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}
