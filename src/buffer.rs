//! Bounds-checked byte buffer used when assembling section payloads.
//!
//! The segmentation engine fills one fixed-capacity buffer per section and
//! flushes it whenever the next item would not fit. All multi-byte integers
//! are big-endian, as everywhere in MPEG section syntax.

use thiserror::Error;

/// Result type for encoding operations.
pub type EncodingResult<T> = Result<T, EncodingError>;

/// Errors that can occur while encoding sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A write would exceed the buffer capacity.
    #[error("buffer overflow: needed {needed} bytes, had {available}")]
    BufferOverflow {
        /// Number of bytes the write required.
        needed: usize,
        /// Number of bytes that were available.
        available: usize,
    },

    /// A patch targeted an offset that has not been written yet.
    #[error("patch at offset {offset} is outside the written range of {len} bytes")]
    PatchOutOfRange {
        /// Offset of the attempted patch.
        offset: usize,
        /// Number of bytes written so far.
        len: usize,
    },

    /// A descriptor payload exceeds the 255-byte limit of its length field.
    #[error("descriptor payload of {len} bytes exceeds the 255-byte limit")]
    PayloadTooLong {
        /// Actual payload length.
        len: usize,
    },
}

/// A fixed-capacity, append-only byte buffer with big-endian accessors.
///
/// Unlike a plain `Vec<u8>`, every write is checked against the capacity so
/// the caller can rely on `remaining()` for its space accounting, and
/// already-written bytes can be patched in place. Back-patching is how the
/// descriptor loop length is filled in once the loop has been serialized.
#[derive(Debug)]
pub struct SectionBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl SectionBuffer {
    /// Creates an empty buffer that can hold up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    fn check(&self, needed: usize) -> EncodingResult<()> {
        if needed > self.remaining() {
            return Err(EncodingError::BufferOverflow {
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Appends a single byte.
    pub fn put_u8(&mut self, value: u8) -> EncodingResult<()> {
        self.check(1)?;
        self.data.push(value);
        Ok(())
    }

    /// Appends a big-endian 16-bit integer.
    pub fn put_u16(&mut self, value: u16) -> EncodingResult<()> {
        self.check(2)?;
        self.data.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Appends raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> EncodingResult<()> {
        self.check(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Overwrites two already-written bytes at `offset` with a big-endian
    /// 16-bit integer.
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> EncodingResult<()> {
        if offset + 2 > self.data.len() {
            return Err(EncodingError::PatchOutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        self.data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Drops everything written after the first `len` bytes.
    ///
    /// The segmentation engine uses this after flushing a section to rewind
    /// the buffer to the constant payload header.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
