//! Encoding and decoding of DVB service information tables, using the
//! Service Description Table as carried in MPEG transport stream sections.
//!
//! A logical table is unbounded; the sections that carry it are not. The
//! core of this crate is the two-way mapping between the two:
//!
//! * [`Sdt::to_sections`] splits a table into the minimum number of
//!   conformant sections, continuing a service's descriptor loop into the
//!   next section when it does not fit, with the service header repeated.
//! * [`Sdt::from_sections`] folds a section sequence back into one table,
//!   rejecting structurally invalid input by marking the table invalid
//!   rather than panicking; malformed off-air data is an expected input.
//!
//! Sections themselves are framed and unframed by [`Section::encode_to_vec`]
//! and [`Section::parse`], including the MPEG-2 CRC-32 when the
//! `crc-validation` feature is enabled.
//!
//! # Example
//!
//! ```rust
//! use dvbsi::{Sdt, SdtScope};
//! use dvbsi::builders::{SdtBuilder, ServiceBuilder};
//!
//! let sdt = SdtBuilder::new(SdtScope::Actual)
//!     .version(1)
//!     .transport_stream_id(0x0044)
//!     .original_network_id(0x1001)
//!     .service(
//!         0x0101,
//!         ServiceBuilder::new()
//!             .service_type(0x01)
//!             .provider("ACME")
//!             .name("Sports")
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let sections = sdt.to_sections().unwrap();
//! let decoded = Sdt::from_sections(&sections);
//! assert!(decoded.is_valid());
//! assert_eq!(decoded.find_service("Sports", true), Some(0x0101));
//! ```

pub mod buffer;
pub mod builders;
pub mod crc;
pub mod descriptor;
pub mod flags;
pub mod fmt;
pub mod section;
pub mod sdt;

#[cfg(feature = "serde")]
mod serde;

#[cfg(test)]
mod tests;

pub use buffer::{EncodingError, EncodingResult, SectionBuffer};
pub use descriptor::{Descriptor, DescriptorList, DescriptorTag};
pub use flags::{RunningStatus, ServiceFlags, StatusLoopLength};
pub use sdt::{Sdt, SdtScope, Service, TID_SDT_ACTUAL, TID_SDT_OTHER};
pub use section::{MAX_LONG_SECTION_PAYLOAD, MAX_SECTION_SIZE, Section, SectionDecodeError};
