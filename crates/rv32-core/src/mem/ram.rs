use thiserror::Error;

use super::MemoryPort;

/// Memory image loading failure; a startup error, never a core trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ImageError {
    /// The image does not fit in the configured memory size.
    #[error("image is {image} bytes but memory holds only {memory}")]
    TooLarge {
        /// Image length in bytes.
        image: usize,
        /// Backing memory size in bytes.
        memory: usize,
    },
}

/// Software memory realization: a flat little-endian byte buffer.
///
/// Word accesses are bounds-checked; an out-of-range access panics, because
/// the alignment layer has already vetted the address and a bad one here
/// means the simulator itself is corrupt, not the guest program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    bytes: Box<[u8]>,
}

impl Ram {
    /// Allocates a zeroed buffer of `size` bytes.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize].into_boxed_slice(),
        }
    }

    /// Copies a flat binary image to the start of memory.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::TooLarge`] when the image exceeds the buffer.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), ImageError> {
        if image.len() > self.bytes.len() {
            return Err(ImageError::TooLarge {
                image: image.len(),
                memory: self.bytes.len(),
            });
        }
        self.bytes[..image.len()].copy_from_slice(image);
        Ok(())
    }
}

impl MemoryPort for Ram {
    #[allow(clippy::cast_possible_truncation)]
    fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn read_word(&mut self, addr: u32) -> u32 {
        let i = addr as usize;
        assert!(
            i + 4 <= self.bytes.len(),
            "word read out of range at {addr:#010x}"
        );
        u32::from_le_bytes([
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ])
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        let i = addr as usize;
        assert!(
            i + 4 <= self.bytes.len(),
            "word write out of range at {addr:#010x}"
        );
        self.bytes[i..i + 4].copy_from_slice(&value.to_le_bytes());
    }
}
