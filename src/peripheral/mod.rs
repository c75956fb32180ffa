//! GPIO peripheral mapping
//!
//! Maps the GPIO controller's register block out of `/dev/mem` into the process,
//! the same way the Broadcom datasheet examples do from user space. The mapping
//! needs root (or `CAP_SYS_RAWIO`).
//!
//! # Usage
//!
//! ```rust,no_run
//! use dshot_gpio::peripheral::MappedRegisters;
//! use dshot_gpio::Board;
//!
//! let window = MappedRegisters::open(Board::Bcm2837)?;
//! # Ok::<(), dshot_gpio::DshotError>(())
//! ```

#[cfg(unix)]
mod mapper;

#[cfg(unix)]
pub use mapper::MappedRegisters;

use crate::Board;

/// Memory device exposing physical addresses.
pub const DEV_MEM: &str = "/dev/mem";

/// Bytes mapped for the GPIO block.
pub const BLOCK_SIZE: usize = 4 * 1024;

/// 32-bit registers in the mapped block.
pub const BLOCK_WORDS: usize = BLOCK_SIZE / std::mem::size_of::<u32>();

/// Map the GPIO block of the default board.
#[cfg(unix)]
pub fn open_peripheral() -> crate::Result<MappedRegisters> {
    MappedRegisters::open(Board::default())
}

/// Register mapping needs `/dev/mem`, which only exists on unix targets.
#[cfg(not(unix))]
pub fn open_peripheral() -> crate::Result<std::convert::Infallible> {
    Err(crate::DshotError::unsupported_platform(
        format!("Mapping GPIO registers for {:?}", Board::default()),
        "Linux",
    ))
}
