//! In-memory register window for tests and dry runs

use std::cell::Cell;

use super::{RegisterWindow, check_index};
use crate::Result;
use crate::peripheral::BLOCK_WORDS;

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub index: usize,
    pub value: u32,
}

/// Heap-backed register block that records every access.
///
/// Behaves as plain memory: writing the set or clear register does not change
/// the level register the way the real GPIO controller would.
#[derive(Debug, Default)]
pub struct MemoryRegisters {
    words: Vec<u32>,
    writes: Vec<RegisterWrite>,
    reads: Cell<usize>,
}

impl MemoryRegisters {
    /// Zero-filled window of `len` words.
    pub fn new(len: usize) -> Self {
        Self::from_words(vec![0; len])
    }

    /// Window the size of the mapped GPIO block.
    pub fn gpio_block() -> Self {
        Self::new(BLOCK_WORDS)
    }

    /// Window pre-loaded with register contents.
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words, writes: Vec::with_capacity(64), reads: Cell::new(0) }
    }

    /// Current register contents.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Writes in the order they happened.
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Writes to one register, in order.
    pub fn writes_to(&self, index: usize) -> impl Iterator<Item = u32> + '_ {
        self.writes.iter().filter(move |w| w.index == index).map(|w| w.value)
    }

    /// Number of reads since creation or the last [`Self::clear_log`].
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Whether nothing has been read or written since the log was cleared.
    pub fn is_untouched(&self) -> bool {
        self.writes.is_empty() && self.reads.get() == 0
    }

    /// Forget recorded accesses, keeping register contents.
    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.reads.set(0);
    }
}

impl RegisterWindow for MemoryRegisters {
    fn len(&self) -> usize {
        self.words.len()
    }

    fn read(&self, index: usize) -> Result<u32> {
        check_index(index, self.words.len())?;
        self.reads.set(self.reads.get() + 1);
        Ok(self.words[index])
    }

    fn write(&mut self, index: usize, value: u32) -> Result<()> {
        check_index(index, self.words.len())?;
        self.words[index] = value;
        self.writes.push(RegisterWrite { index, value });
        Ok(())
    }
}
