//! `/dev/mem` backed register window

use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::ptr;

use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, trace};

use super::{BLOCK_SIZE, BLOCK_WORDS, DEV_MEM};
use crate::window::{RegisterWindow, check_index};
use crate::{Board, DshotError, Result};

/// The GPIO register block mapped into this process.
///
/// The file descriptor is closed right after mapping; the mapping itself stays
/// valid until this value is dropped.
pub struct MappedRegisters {
    map: MmapMut,
    board: Board,
}

impl MappedRegisters {
    /// Open `/dev/mem` and map the GPIO block of `board`.
    ///
    /// # Errors
    ///
    /// - [`DshotError::HardwareAccessDenied`] when `/dev/mem` cannot be opened
    ///   (not root, device missing, kernel lockdown)
    /// - [`DshotError::MappingFailed`] when the kernel rejects the mapping
    pub fn open(board: Board) -> Result<Self> {
        let offset = board.gpio_base();
        trace!(device = DEV_MEM, offset = %format!("{offset:#x}"), "Mapping GPIO registers");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(DEV_MEM)
            .map_err(|e| DshotError::hardware_access_denied(DEV_MEM, e))?;

        // SAFETY: /dev/mem at the GPIO base is device memory that no other Rust
        // object aliases; all access goes through volatile reads and writes.
        let map = unsafe { MmapOptions::new().offset(offset).len(BLOCK_SIZE).map_mut(&file) }
            .map_err(|e| DshotError::mapping_failed(offset, e))?;

        drop(file);

        debug!(?board, offset = %format!("{offset:#x}"), "Mapped GPIO register block");
        Ok(Self { map, board })
    }

    /// Board this block was mapped for.
    pub fn board(&self) -> Board {
        self.board
    }
}

impl RegisterWindow for MappedRegisters {
    fn len(&self) -> usize {
        BLOCK_WORDS
    }

    #[inline(always)]
    fn read(&self, index: usize) -> Result<u32> {
        check_index(index, BLOCK_WORDS)?;
        // SAFETY: index is inside the page-aligned mapping of BLOCK_SIZE bytes.
        Ok(unsafe { ptr::read_volatile((self.map.as_ptr() as *const u32).add(index)) })
    }

    #[inline(always)]
    fn write(&mut self, index: usize, value: u32) -> Result<()> {
        check_index(index, BLOCK_WORDS)?;
        // SAFETY: index is inside the page-aligned mapping of BLOCK_SIZE bytes.
        unsafe { ptr::write_volatile((self.map.as_mut_ptr() as *mut u32).add(index), value) };
        Ok(())
    }
}

impl std::fmt::Debug for MappedRegisters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegisters")
            .field("board", &self.board)
            .field("base", &format_args!("{:#x}", self.board.gpio_base()))
            .finish()
    }
}
