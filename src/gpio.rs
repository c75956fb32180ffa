//! GPIO pin control over a register window
//!
//! Register word indices follow the BCM2835 ARM Peripherals manual (section 6.1);
//! the BCM2836, BCM2837 and BCM2711 keep the same layout for the registers used here.

use crate::types::GpioPin;
use crate::window::RegisterWindow;
use crate::Result;

/// Function select registers, three bits per pin, ten pins per register.
pub const GPFSEL0: usize = 0;
/// Output set register for pins 0-31 (write 1 to drive high, 0 is a no-op).
pub const GPSET0: usize = 7;
/// Output clear register for pins 0-31 (write 1 to drive low, 0 is a no-op).
pub const GPCLR0: usize = 10;
/// Pin level register for pins 0-31.
pub const GPLEV0: usize = 13;

/// Function-select field value for output mode.
pub const FSEL_OUTPUT: u32 = 0b001;
/// Width mask of a function-select field.
pub const FSEL_MASK: u32 = 0b111;

/// Configure `pin` as an output and drive it low.
///
/// The function-select field is cleared to input first and only then set to
/// output. Setting the output bit on top of a stale alternate function would
/// leave a different function selected.
pub fn configure_output<W: RegisterWindow>(window: &mut W, pin: GpioPin) -> Result<()> {
    let register = GPFSEL0 + pin.function_select_register();
    let shift = pin.function_select_shift();

    window.modify(register, |v| v & !(FSEL_MASK << shift))?;
    window.modify(register, |v| v | (FSEL_OUTPUT << shift))?;
    clear(window, pin)
}

/// Drive `pin` high.
#[inline(always)]
pub fn set<W: RegisterWindow>(window: &mut W, pin: GpioPin) -> Result<()> {
    window.write(GPSET0, pin.mask())
}

/// Drive `pin` low.
#[inline(always)]
pub fn clear<W: RegisterWindow>(window: &mut W, pin: GpioPin) -> Result<()> {
    window.write(GPCLR0, pin.mask())
}

/// Current level of `pin`.
pub fn level<W: RegisterWindow>(window: &W, pin: GpioPin) -> Result<bool> {
    Ok(window.read(GPLEV0)? & pin.mask() != 0)
}

/// Current 3-bit function of `pin`.
pub fn function<W: RegisterWindow>(window: &W, pin: GpioPin) -> Result<u32> {
    let value = window.read(GPFSEL0 + pin.function_select_register())?;
    Ok((value >> pin.function_select_shift()) & FSEL_MASK)
}
