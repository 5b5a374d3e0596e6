use byteorder::ByteOrder;

use crate::{constants, Endian, Word};

/// Flat byte-addressable VM memory.
///
/// All multi-byte accesses are little-endian. Accesses are range-checked;
/// an `Err` from any accessor means the range fell outside memory.
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Creates a zeroed memory of the standard size (1 MiB).
    ///
    /// # Examples
    /// ```
    /// use bsvm::Memory;
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.length(), 1 << 20);
    /// assert_eq!(memory.read_byte(0), Ok(0));
    /// ```
    pub fn new() -> Memory {
        Memory {
            data: vec![0; constants::MEMORY_BYTES],
        }
    }

    /// Returns the total length of the memory in bytes.
    pub fn length(&self) -> u32 {
        self.data.len() as u32
    }

    /// Checks whether `[address..address+length]` is addressable.
    pub fn check_range(&self, address: u32, length: u32) -> bool {
        u64::from(address) + u64::from(length) <= self.data.len() as u64
    }

    /// Immutably borrows the byte range at `address`.
    ///
    /// # Examples
    /// ```
    /// use bsvm::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.load(1, &[10, 20, 30]).unwrap();
    /// assert_eq!(memory.borrow_slice(2, 2), Ok(&[20, 30][..]));
    /// assert_eq!(memory.borrow_slice(1 << 20, 1), Err(()));
    /// ```
    pub fn borrow_slice(&self, address: u32, length: u32) -> Result<&[u8], ()> {
        if self.check_range(address, length) {
            let start = address as usize;
            Ok(&self.data[start..start + length as usize])
        } else {
            Err(())
        }
    }

    fn borrow_slice_mut(&mut self, address: u32, length: u32) -> Result<&mut [u8], ()> {
        if self.check_range(address, length) {
            let start = address as usize;
            Ok(&mut self.data[start..start + length as usize])
        } else {
            Err(())
        }
    }

    /// Reads one byte.
    pub fn read_byte(&self, address: u32) -> Result<u8, ()> {
        Ok(self.borrow_slice(address, 1)?[0])
    }

    /// Reads a little-endian 32-bit word.
    pub fn read_word(&self, address: u32) -> Result<Word, ()> {
        Ok(Endian::read_i32(self.borrow_slice(address, constants::WORD_BYTES)?))
    }

    /// Writes one byte.
    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), ()> {
        self.borrow_slice_mut(address, 1)?[0] = value;
        Ok(())
    }

    /// Writes a little-endian 32-bit word.
    pub fn write_word(&mut self, address: u32, value: Word) -> Result<(), ()> {
        Endian::write_i32(self.borrow_slice_mut(address, constants::WORD_BYTES)?, value);
        Ok(())
    }

    /// Copies a program image into memory starting at `address`.
    pub fn load(&mut self, address: u32, image: &[u8]) -> Result<(), ()> {
        self.borrow_slice_mut(address, image.len() as u32)?
            .copy_from_slice(image);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}
