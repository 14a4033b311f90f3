//! Formatting utilities for SI data structures.
//!
//! Human-readable rendering of status codes and opaque descriptor payloads,
//! used by the CLI text output. Payloads are shown as text when they look
//! like text and as hex otherwise.

use crate::flags::RunningStatus;

/// Human-readable name of a running status value.
///
/// # Examples
/// ```rust
/// use dvbsi::flags::RunningStatus;
/// use dvbsi::fmt::running_status_name;
///
/// assert_eq!(running_status_name(RunningStatus::Running), "running");
/// assert_eq!(running_status_name(RunningStatus::Undefined), "undefined");
/// ```
pub fn running_status_name(status: RunningStatus) -> &'static str {
    match status {
        RunningStatus::Undefined => "undefined",
        RunningStatus::NotRunning => "not running",
        RunningStatus::StartsShortly => "starts in a few seconds",
        RunningStatus::Pausing => "pausing",
        RunningStatus::Running => "running",
        RunningStatus::OffAir => "off-air",
        RunningStatus::Reserved6 | RunningStatus::Reserved7 => "reserved",
    }
}

/// Formats an opaque payload for display, showing it as a string if it is
/// printable text, otherwise as hex.
///
/// # Examples
/// ```rust
/// use dvbsi::fmt::format_payload;
///
/// assert_eq!(format_payload(b"test"), "\"test\"");
/// assert_eq!(format_payload(&[0x01, 0x02, 0x03]), "0x010203");
/// assert_eq!(format_payload(&[]), "empty");
/// ```
pub fn format_payload(data: &[u8]) -> String {
    if data.is_empty() {
        return "empty".to_string();
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if s.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
            return format!("\"{}\"", s);
        }
    }
    format_as_hex(data)
}

/// Formats data as a hex string with a length limit for readability.
///
/// # Examples
/// ```rust
/// use dvbsi::fmt::format_as_hex;
///
/// assert_eq!(format_as_hex(&[0x01, 0x02, 0x03]), "0x010203");
/// assert_eq!(format_as_hex(&(0..20).collect::<Vec<u8>>()), "0x000102030405... (20 bytes)");
/// ```
pub fn format_as_hex(data: &[u8]) -> String {
    if data.len() <= 8 {
        format!(
            "0x{}",
            data.iter()
                .map(|b| format!("{:02x}", b))
                .collect::<String>()
        )
    } else {
        let preview: String = data[..6].iter().map(|b| format!("{:02x}", b)).collect();
        format!("0x{}... ({} bytes)", preview, data.len())
    }
}
