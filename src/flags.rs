//! Bit-packed fields of the SDT service loop.
//!
//! The service loop reuses bits that look reserved at first glance: the byte
//! after the service id carries the two EIT presence flags in its low bits,
//! and the top nibble of the descriptor loop length holds the running status
//! and the free-CA bit. Both packing rules live here so they stay bit-exact
//! and testable in isolation.

/// EIT presence flags carried in the byte following the service id.
///
/// Wire layout: `1111 11sp` where `s` is `EIT_schedule_flag` and `p` is
/// `EIT_present_following_flag`; the six high bits are reserved and set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceFlags {
    /// Schedule information for this service is present in the EIT.
    pub eit_schedule: bool,
    /// Present/following information for this service is present in the EIT.
    pub eit_present_following: bool,
}

impl ServiceFlags {
    /// Packs the flags into the wire byte.
    pub fn pack(self) -> u8 {
        0xFC | (u8::from(self.eit_schedule) << 1) | u8::from(self.eit_present_following)
    }

    /// Extracts the flags from the wire byte, ignoring the reserved bits.
    pub fn unpack(byte: u8) -> Self {
        Self {
            eit_schedule: byte & 0x02 != 0,
            eit_present_following: byte & 0x01 != 0,
        }
    }
}

/// Running status of a service (ETSI EN 300 468, 3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunningStatus {
    /// Undefined (0).
    #[default]
    Undefined,
    /// Not running (1).
    NotRunning,
    /// Starts in a few seconds (2).
    StartsShortly,
    /// Pausing (3).
    Pausing,
    /// Running (4).
    Running,
    /// Service off-air (5).
    OffAir,
    /// Reserved for future use (6).
    Reserved6,
    /// Reserved for future use (7).
    Reserved7,
}

impl From<u8> for RunningStatus {
    fn from(value: u8) -> Self {
        match value & 0x07 {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsShortly,
            3 => RunningStatus::Pausing,
            4 => RunningStatus::Running,
            5 => RunningStatus::OffAir,
            6 => RunningStatus::Reserved6,
            _ => RunningStatus::Reserved7,
        }
    }
}

impl From<RunningStatus> for u8 {
    fn from(value: RunningStatus) -> Self {
        match value {
            RunningStatus::Undefined => 0,
            RunningStatus::NotRunning => 1,
            RunningStatus::StartsShortly => 2,
            RunningStatus::Pausing => 3,
            RunningStatus::Running => 4,
            RunningStatus::OffAir => 5,
            RunningStatus::Reserved6 => 6,
            RunningStatus::Reserved7 => 7,
        }
    }
}

/// The 16-bit pair holding the descriptor loop length and the status bits.
///
/// Wire layout: `rrrc llll llll llll` where `rrr` is the running status,
/// `c` is `free_CA_mode` and the low 12 bits are the descriptor loop length
/// in bytes. Decoders must mask with `0x0FFF` before using the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLoopLength {
    /// Running status of the service.
    pub running_status: RunningStatus,
    /// One or more streams of the service are CA controlled.
    pub free_ca_mode: bool,
    /// Descriptor loop length in bytes, at most `0x0FFF`.
    pub loop_length: u16,
}

impl StatusLoopLength {
    /// Packs the fields into the wire value.
    pub fn pack(self) -> u16 {
        (u16::from(u8::from(self.running_status)) << 13)
            | (u16::from(self.free_ca_mode) << 12)
            | (self.loop_length & 0x0FFF)
    }

    /// Splits the wire value back into its fields.
    pub fn unpack(raw: u16) -> Self {
        Self {
            running_status: RunningStatus::from((raw >> 13) as u8),
            free_ca_mode: raw & 0x1000 != 0,
            loop_length: raw & 0x0FFF,
        }
    }
}
