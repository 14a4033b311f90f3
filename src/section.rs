//! Long-form SI sections and their wire framing.
//!
//! A section is the physical unit a table travels in: a bounded payload plus
//! the header fields that let a receiver group sections back into one logical
//! table. Sections are value objects; the segmentation engine produces them
//! and never mutates one after it has been emitted.

use thiserror::Error;

use crate::crc::{calculate_crc, validate_crc};

/// Maximum total size of a DVB SI section in bytes, including the three
/// header bytes and the CRC-32 (ETSI EN 300 468).
pub const MAX_SECTION_SIZE: usize = 1024;

/// Maximum payload of a long-form section: the total minus the 3-byte
/// prefix, the 5-byte extended header and the 4-byte CRC-32.
pub const MAX_LONG_SECTION_PAYLOAD: usize = MAX_SECTION_SIZE - 12;

/// Errors from parsing a section out of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionDecodeError {
    /// Fewer bytes than the smallest possible section.
    #[error("insufficient data for a section header")]
    InsufficientData,

    /// The section syntax indicator is clear; this codec only handles
    /// long-form sections.
    #[error("not a long-form section")]
    NotLongForm,

    /// The declared length exceeds the DVB section size limit.
    #[error("section of {0} bytes exceeds the {MAX_SECTION_SIZE}-byte limit")]
    TooLong(usize),

    /// The declared length runs past the end of the input.
    #[error("truncated section: declared {declared} bytes, {available} available")]
    Truncated {
        /// Total section size the header declares.
        declared: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// The declared length is too small to hold the extended header and CRC.
    #[error("corrupted section: declared length too small for a long-form section")]
    Corrupted,

    /// The CRC-32 at the end of the section does not match its content.
    #[error("CRC-32 mismatch")]
    CrcMismatch,
}

/// One long-form private section.
///
/// `payload` is the table-specific part between the extended header and the
/// CRC-32. Its length never exceeds [`MAX_LONG_SECTION_PAYLOAD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Table id identifying the table type.
    pub table_id: u8,
    /// Table id extension; for the SDT this is the transport stream id.
    pub table_id_extension: u16,
    /// Version number of the table, 0..=31.
    pub version: u8,
    /// Current/next indicator: true when the table is currently applicable.
    pub is_current: bool,
    /// Number of this section within the table, starting at 0.
    pub section_number: u8,
    /// Number of the last section of the table.
    pub last_section_number: u8,
    /// Table-specific payload.
    pub payload: Vec<u8>,
}

impl Section {
    /// Checks the self-consistency rules a section must satisfy before its
    /// payload is worth interpreting.
    pub fn is_well_formed(&self) -> bool {
        self.payload.len() <= MAX_LONG_SECTION_PAYLOAD
            && self.version <= 31
            && self.section_number <= self.last_section_number
    }

    /// Total encoded size in bytes, including prefix, extended header and CRC.
    pub fn encoded_size(&self) -> usize {
        3 + 5 + self.payload.len() + 4
    }

    /// Encodes the section into its wire form.
    ///
    /// The CRC-32 is computed over everything that precedes it; with the
    /// `crc-validation` feature disabled a zero placeholder is written.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let section_length = 5 + self.payload.len() + 4;
        let mut out = Vec::with_capacity(3 + section_length);

        out.push(self.table_id);
        // section_syntax_indicator, reserved_future_use and two reserved
        // bits, all set, then the high four bits of section_length.
        out.push(0xF0 | ((section_length >> 8) & 0x0F) as u8);
        out.push(section_length as u8);
        out.extend_from_slice(&self.table_id_extension.to_be_bytes());
        out.push(0xC0 | ((self.version & 0x1F) << 1) | u8::from(self.is_current));
        out.push(self.section_number);
        out.push(self.last_section_number);
        out.extend_from_slice(&self.payload);

        let crc = calculate_crc(&out).unwrap_or(0);
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// Parses one section from the front of `buf`.
    ///
    /// Returns the section and the number of bytes consumed so a sequence of
    /// back-to-back sections can be walked. Declared length, size limit and
    /// CRC are all checked before any field is trusted.
    pub fn parse(buf: &[u8]) -> Result<(Section, usize), SectionDecodeError> {
        if buf.len() < 3 {
            return Err(SectionDecodeError::InsufficientData);
        }

        let table_id = buf[0];
        if buf[1] & 0x80 == 0 {
            return Err(SectionDecodeError::NotLongForm);
        }
        let section_length = (usize::from(buf[1] & 0x0F) << 8) | usize::from(buf[2]);
        let total = 3 + section_length;

        if total > MAX_SECTION_SIZE {
            return Err(SectionDecodeError::TooLong(total));
        }
        // Extended header (5) plus CRC-32 (4) is the smallest long section.
        if section_length < 9 {
            return Err(SectionDecodeError::Corrupted);
        }
        if buf.len() < total {
            return Err(SectionDecodeError::Truncated {
                declared: total,
                available: buf.len(),
            });
        }

        let stored_crc = u32::from_be_bytes([
            buf[total - 4],
            buf[total - 3],
            buf[total - 2],
            buf[total - 1],
        ]);
        if !validate_crc(&buf[..total - 4], stored_crc) {
            return Err(SectionDecodeError::CrcMismatch);
        }

        let section = Section {
            table_id,
            table_id_extension: u16::from_be_bytes([buf[3], buf[4]]),
            version: (buf[5] >> 1) & 0x1F,
            is_current: buf[5] & 0x01 != 0,
            section_number: buf[6],
            last_section_number: buf[7],
            payload: buf[8..total - 4].to_vec(),
        };
        Ok((section, total))
    }
}
