use thiserror::Error;

use crate::constants::{Address, Word, MAX_PROGRAM_SIZE, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address was outside of the address space
    #[error("address {0:#x} is out of bounds")]
    OutOfBounds(Address),
}

/// Holds the bytes of the computer.
///
/// The whole 64 KiB address space is a single flat array: the low region is
/// reserved, the program is copied at [`PROGRAM_START`](crate::constants::PROGRAM_START)
/// and the stack grows down from the top.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ size: {:#x}, .. }}", self.inner.len())
    }
}

impl Memory {
    /// Read the byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn read8(&self, address: Address) -> Result<u8, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfBounds(address))
    }

    /// Write the byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn write8(&mut self, address: Address, value: u8) -> Result<(), MemoryError> {
        let cell = self
            .inner
            .get_mut(address)
            .ok_or(MemoryError::OutOfBounds(address))?;
        *cell = value;
        Ok(())
    }

    /// Read a little-endian word spanning `address` and `address + 1`
    ///
    /// # Errors
    ///
    /// It fails if either byte is out of bounds.
    pub fn read16(&self, address: Address) -> Result<Word, MemoryError> {
        let low = self.read8(address)?;
        let high = self.read8(address + 1)?;
        Ok(Word::from_le_bytes([low, high]))
    }

    /// Write a little-endian word spanning `address` and `address + 1`
    ///
    /// # Errors
    ///
    /// It fails if either byte is out of bounds. Nothing is written in that case.
    pub fn write16(&mut self, address: Address, value: Word) -> Result<(), MemoryError> {
        if address + 1 >= self.inner.len() {
            return Err(MemoryError::OutOfBounds(address + 1));
        }

        let [low, high] = value.to_le_bytes();
        self.write8(address, low)?;
        self.write8(address + 1, high)
    }

    /// Copy a block of bytes starting at `address`
    ///
    /// # Errors
    ///
    /// It fails if the block does not fit, in which case memory is left untouched.
    pub fn load(&mut self, address: Address, bytes: &[u8]) -> Result<(), MemoryError> {
        let end = address + bytes.len();
        let target = self
            .inner
            .get_mut(address..end)
            .ok_or(MemoryError::OutOfBounds(end))?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes from `start` up to the first `terminator`
    ///
    /// The scan stops after [`MAX_PROGRAM_SIZE`] bytes or at the end of memory,
    /// whichever comes first; the result is truncated in both cases.
    #[must_use]
    pub fn terminated(&self, start: Address, terminator: u8) -> &[u8] {
        let Some(region) = self.inner.get(start..) else {
            return &[];
        };
        let region = &region[..region.len().min(MAX_PROGRAM_SIZE)];
        let end = region
            .iter()
            .position(|&b| b == terminator)
            .unwrap_or(region.len());
        &region[..end]
    }
}
