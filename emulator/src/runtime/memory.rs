use thiserror::Error;

use crate::constants::{Address, Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The image does not fit between its origin and the end of memory
    #[error("image of {len} bytes does not fit in memory at origin {origin:#04x}")]
    ImageTooLarge { origin: Address, len: usize },
}

/// Something the processor can read and write bytes from.
///
/// Reads and writes never fail: the whole address space is backed.
pub trait Bus {
    fn read(&self, address: Address) -> Word;
    fn write(&mut self, address: Address, value: Word);
}

/// Holds the memory cells of the computer.
///
/// It has 256 cells, all zeroed on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.inner.iter().filter(|&&w| w != 0).count();
        write!(f, "Memory {{ size: {MEMORY_SIZE}, non_zero: {used} }}")
    }
}

impl Memory {
    /// Create a memory bank with `image` copied at address 0
    ///
    /// # Errors
    ///
    /// Fails if the image is larger than the memory
    pub fn with_image(image: &[Word]) -> Result<Self, MemoryError> {
        let mut memory = Self::default();
        memory.load(image, 0)?;
        Ok(memory)
    }

    /// Copy a byte sequence in memory, starting at `origin`
    ///
    /// Loading does not wrap around the end of the memory.
    ///
    /// # Errors
    ///
    /// Fails if the image does not fit between `origin` and the end of memory
    pub fn load(&mut self, image: &[Word], origin: Address) -> Result<(), MemoryError> {
        let start = usize::from(origin);
        let end = start + image.len();
        let target = self
            .inner
            .get_mut(start..end)
            .ok_or(MemoryError::ImageTooLarge {
                origin,
                len: image.len(),
            })?;
        target.copy_from_slice(image);
        Ok(())
    }

    /// All the memory cells, in address order
    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.inner[..]
    }
}

impl Bus for Memory {
    #[inline]
    fn read(&self, address: Address) -> Word {
        self.inner[usize::from(address)]
    }

    #[inline]
    fn write(&mut self, address: Address, value: Word) {
        self.inner[usize::from(address)] = value;
    }
}

// Lets a computer borrow a memory bank it does not own
impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&self, address: Address) -> Word {
        (**self).read(address)
    }

    fn write(&mut self, address: Address, value: Word) {
        (**self).write(address, value);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn zeroed_on_startup() {
        let memory = Memory::default();
        assert_eq!(memory.as_slice().len(), 256);
        assert!(memory.as_slice().iter().all(|&w| w == 0));
    }

    #[test]
    fn last_address_test() {
        let mut memory = Memory::default();
        memory.write(255, 0x42);
        assert_eq!(memory.read(255), 0x42);
        assert_eq!(memory.read(0), 0); // Did not wrap
    }

    #[test]
    fn load_test() {
        let mut memory = Memory::default();
        memory.load(&[1, 2, 3], 0x10).unwrap();
        assert_eq!(&memory.as_slice()[0x0f..0x14], &[0, 1, 2, 3, 0]);

        // Exactly fills the end of the memory
        memory.load(&[0xaa; 16], 0xf0).unwrap();
        assert_eq!(memory.read(0xff), 0xaa);

        // One byte too many
        assert_eq!(
            memory.load(&[0; 17], 0xf0),
            Err(MemoryError::ImageTooLarge {
                origin: 0xf0,
                len: 17
            })
        );
    }

    #[test]
    fn with_image_test() {
        let memory = Memory::with_image(&[0x05, 0xff]).unwrap();
        assert_eq!(memory.read(0), 0x05);
        assert_eq!(memory.read(1), 0xff);
        assert_eq!(memory.read(2), 0);

        assert!(Memory::with_image(&[0; 256]).is_ok());
        assert!(Memory::with_image(&[0; 257]).is_err());
    }

    #[test]
    fn borrowed_bus_test() {
        let mut memory = Memory::default();
        {
            let mut bus = &mut memory;
            Bus::write(&mut bus, 7, 9);
            assert_eq!(Bus::read(&bus, 7), 9);
        }
        assert_eq!(memory.read(7), 9);
    }
}
