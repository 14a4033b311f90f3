//! CRC-32 support for SI sections.
//!
//! Long-form sections end in an MPEG-2 CRC-32 over everything that precedes
//! it. Calculation and validation are feature-gated so the core codec can be
//! built without the `crc` dependency.

#[cfg(feature = "crc-validation")]
use crc::{CRC_32_MPEG_2, Crc};

/// MPEG-2 CRC-32 algorithm instance used for all SI sections.
#[cfg(feature = "crc-validation")]
pub const MPEG_2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Calculates the MPEG-2 CRC-32 of `data`.
///
/// Returns `None` when the `crc-validation` feature is disabled.
#[cfg(feature = "crc-validation")]
pub fn calculate_crc(data: &[u8]) -> Option<u32> {
    Some(MPEG_2.checksum(data))
}

/// Stub when CRC support is disabled.
#[cfg(not(feature = "crc-validation"))]
pub fn calculate_crc(_data: &[u8]) -> Option<u32> {
    None
}

/// Checks `data` against an expected CRC-32 value.
#[cfg(feature = "crc-validation")]
pub fn validate_crc(data: &[u8], expected_crc: u32) -> bool {
    MPEG_2.checksum(data) == expected_crc
}

/// Stub when CRC support is disabled; validation always passes so sections
/// remain parseable.
#[cfg(not(feature = "crc-validation"))]
pub fn validate_crc(_data: &[u8], _expected_crc: u32) -> bool {
    true
}
