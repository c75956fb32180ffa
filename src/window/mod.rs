//! Register window abstraction
//!
//! A register window is a block of 32-bit registers addressed by word index.
//! The pin controller and pulse transmitter only talk to this trait, so the same
//! code drives the real GPIO block ([`crate::peripheral::MappedRegisters`]) and a
//! plain in-memory block ([`MemoryRegisters`]) used for tests and dry runs.
//!
//! Every access is bounds-checked against [`RegisterWindow::len`]; an index past
//! the end yields [`crate::DshotError::RegisterOutOfBounds`] instead of touching
//! memory outside the mapping.

mod memory;

pub use memory::{MemoryRegisters, RegisterWrite};

use crate::{DshotError, Result};

/// Word-indexed access to a block of 32-bit registers.
pub trait RegisterWindow {
    /// Number of 32-bit words in the window.
    fn len(&self) -> usize;

    /// Whether the window has no registers.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the register at `index`.
    fn read(&self, index: usize) -> Result<u32>;

    /// Write `value` to the register at `index`.
    fn write(&mut self, index: usize, value: u32) -> Result<()>;

    /// Read, transform and write back a register.
    ///
    /// Not atomic. Only used for function-select fields, never on the hot path.
    fn modify<F>(&mut self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(u32) -> u32,
        Self: Sized,
    {
        let value = self.read(index)?;
        self.write(index, f(value))
    }
}

/// Shared bounds check for window implementations.
#[inline(always)]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len { Ok(()) } else { Err(DshotError::RegisterOutOfBounds { index, len }) }
}

impl<W: RegisterWindow + ?Sized> RegisterWindow for &mut W {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read(&self, index: usize) -> Result<u32> {
        (**self).read(index)
    }

    fn write(&mut self, index: usize, value: u32) -> Result<()> {
        (**self).write(index, value)
    }
}
