//! The Service Description Table and its section codec.
//!
//! An SDT is a logical table of services keyed by service id. On the wire it
//! is carried in one or more long-form sections, each at most
//! [`MAX_LONG_SECTION_PAYLOAD`] bytes of payload. This module implements both
//! directions of that mapping: [`Sdt::to_sections`] walks the service map and
//! splits it into the minimum number of conformant sections, continuing an
//! oversized descriptor loop into the next section when it has to, and
//! [`Sdt::from_sections`] folds an arbitrary section sequence back into one
//! table, marking the result invalid instead of failing on malformed input.

use std::collections::BTreeMap;

use crate::buffer::{EncodingResult, SectionBuffer};
use crate::descriptor::{Descriptor, DescriptorList, DescriptorTag};
use crate::flags::{RunningStatus, ServiceFlags, StatusLoopLength};
use crate::section::{MAX_LONG_SECTION_PAYLOAD, Section};

/// Table id of the SDT describing the actual transport stream.
pub const TID_SDT_ACTUAL: u8 = 0x42;

/// Table id of the SDT describing another transport stream.
pub const TID_SDT_OTHER: u8 = 0x46;

/// Constant part at the start of every section payload: the original
/// network id plus one reserved byte.
const PAYLOAD_HEADER_SIZE: usize = 3;

/// Fixed part of one service entry: service id, EIT flags byte and the
/// status/loop-length pair. Never split across sections.
const SERVICE_HEADER_SIZE: usize = 5;

/// Which transport stream an SDT describes.
///
/// The two variants differ only by table id; the section layout is
/// identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdtScope {
    /// The transport stream carrying the table itself (table id 0x42).
    Actual,
    /// Another transport stream of the network (table id 0x46).
    Other,
}

impl SdtScope {
    /// The table id sections of this scope carry.
    pub fn table_id(self) -> u8 {
        match self {
            SdtScope::Actual => TID_SDT_ACTUAL,
            SdtScope::Other => TID_SDT_OTHER,
        }
    }

    /// Maps a table id back to a scope, if it is an SDT table id at all.
    pub fn from_table_id(table_id: u8) -> Option<Self> {
        match table_id {
            TID_SDT_ACTUAL => Some(SdtScope::Actual),
            TID_SDT_OTHER => Some(SdtScope::Other),
            _ => None,
        }
    }
}

/// One service described by an SDT.
///
/// A service has no identity of its own; it is meaningful only under its
/// service id in a table's map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Service {
    /// Schedule information for this service is present in the EIT.
    pub eit_schedule: bool,
    /// Present/following information for this service is present in the EIT.
    pub eit_present_following: bool,
    /// Running status of the service.
    pub running_status: RunningStatus,
    /// One or more streams of the service are CA controlled.
    pub free_ca_mode: bool,
    /// Descriptor loop of the service.
    pub descriptors: DescriptorList,
}

impl Service {
    fn service_descriptor(&self) -> Option<&Descriptor> {
        self.descriptors
            .find_first(DescriptorTag::Service)
            .and_then(|i| self.descriptors.get(i))
    }

    /// Service type from the first service descriptor, or 0 ("reserved")
    /// when there is none.
    pub fn service_type(&self) -> u8 {
        match self.service_descriptor() {
            Some(d) if d.payload_size() >= 1 => d.payload()[0],
            _ => 0,
        }
    }

    /// Provider name from the first service descriptor.
    ///
    /// The length byte is clamped against the payload, so a truncated
    /// descriptor yields a shortened name rather than an error.
    pub fn provider_name(&self) -> String {
        let Some(d) = self.service_descriptor() else {
            return String::new();
        };
        let p = d.payload();
        if p.len() < 2 {
            return String::new();
        }
        let length = (p[1] as usize).min(p.len() - 2);
        String::from_utf8_lossy(&p[2..2 + length]).into_owned()
    }

    /// Service name from the first service descriptor, clamped the same way
    /// as [`provider_name`].
    ///
    /// [`provider_name`]: Service::provider_name
    pub fn service_name(&self) -> String {
        let Some(d) = self.service_descriptor() else {
            return String::new();
        };
        let p = d.payload();
        if p.len() < 2 {
            return String::new();
        }
        let provider_length = (p[1] as usize).min(p.len() - 2);
        let rest = &p[2 + provider_length..];
        if rest.is_empty() {
            return String::new();
        }
        let length = (rest[0] as usize).min(rest.len() - 1);
        String::from_utf8_lossy(&rest[1..1 + length]).into_owned()
    }

    /// Sets the service name, rewriting the existing service descriptor or
    /// synthesizing a new one. The provider name is preserved;
    /// `service_type` is only used when a descriptor has to be created.
    pub fn set_name(&mut self, name: &str, service_type: u8) -> EncodingResult<()> {
        let (service_type, provider) = match self.service_descriptor() {
            Some(d) if d.payload_size() >= 2 => {
                let p = d.payload();
                let length = (p[1] as usize).min(p.len() - 2);
                (p[0], p[2..2 + length].to_vec())
            }
            _ => (service_type, Vec::new()),
        };
        let payload = build_service_payload(service_type, &provider, name.as_bytes())?;
        self.store_service_payload(payload)
    }

    /// Sets the provider name, preserving the service type and name of an
    /// existing descriptor.
    pub fn set_provider(&mut self, provider: &str, service_type: u8) -> EncodingResult<()> {
        let (service_type, name) = match self.service_descriptor() {
            Some(d) if d.payload_size() >= 1 => {
                let p = d.payload();
                let mut name = Vec::new();
                if p.len() >= 2 {
                    let provider_length = p[1] as usize;
                    if 2 + provider_length + 1 <= p.len() {
                        let length = (p[2 + provider_length] as usize)
                            .min(p.len() - 2 - provider_length - 1);
                        name = p[2 + provider_length + 1..][..length].to_vec();
                    }
                }
                (p[0], name)
            }
            _ => (service_type, Vec::new()),
        };
        let payload = build_service_payload(service_type, provider.as_bytes(), &name)?;
        self.store_service_payload(payload)
    }

    /// Sets the service type, synthesizing a minimal descriptor with empty
    /// provider and name when none exists yet.
    pub fn set_type(&mut self, service_type: u8) -> EncodingResult<()> {
        match self.descriptors.find_first(DescriptorTag::Service) {
            Some(i) => {
                if let Some(d) = self.descriptors.get_mut(i) {
                    if d.payload_size() >= 1 {
                        let mut payload = d.payload().to_vec();
                        payload[0] = service_type;
                        return d.replace_payload(payload);
                    }
                    return d.replace_payload(vec![service_type, 0, 0]);
                }
                Ok(())
            }
            None => {
                self.descriptors
                    .push(Descriptor::new(DescriptorTag::Service, vec![service_type, 0, 0])?);
                Ok(())
            }
        }
    }

    fn store_service_payload(&mut self, payload: Vec<u8>) -> EncodingResult<()> {
        match self.descriptors.find_first(DescriptorTag::Service) {
            Some(i) => {
                if let Some(d) = self.descriptors.get_mut(i) {
                    d.replace_payload(payload)?;
                }
                Ok(())
            }
            None => {
                self.descriptors
                    .push(Descriptor::new(DescriptorTag::Service, payload)?);
                Ok(())
            }
        }
    }
}

/// Builds a service descriptor payload: service type byte, length-prefixed
/// provider name, length-prefixed service name.
fn build_service_payload(
    service_type: u8,
    provider: &[u8],
    name: &[u8],
) -> EncodingResult<Vec<u8>> {
    let total = 3 + provider.len() + name.len();
    if provider.len() > 255 || name.len() > 255 || total > 255 {
        return Err(crate::buffer::EncodingError::PayloadTooLong { len: total });
    }
    let mut payload = Vec::with_capacity(total);
    payload.push(service_type);
    payload.push(provider.len() as u8);
    payload.extend_from_slice(provider);
    payload.push(name.len() as u8);
    payload.extend_from_slice(name);
    Ok(payload)
}

/// True when the names match ignoring case and whitespace.
fn similar(a: &str, b: &str) -> bool {
    fn canonical(s: &str) -> impl Iterator<Item = char> + '_ {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
    }
    canonical(a).eq(canonical(b))
}

/// A Service Description Table.
///
/// Constructed empty and valid via [`new`], or from a section sequence via
/// [`from_sections`], in which case [`is_valid`] reports whether the input
/// passed every structural check. An invalid table has all fields cleared;
/// partial decode state is never exposed.
///
/// [`new`]: Sdt::new
/// [`from_sections`]: Sdt::from_sections
/// [`is_valid`]: Sdt::is_valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdt {
    /// Scope of the table: this transport stream or another one.
    pub scope: SdtScope,
    /// Version number, 0..=31. Bumped by the table's owner on change, not by
    /// this codec.
    pub version: u8,
    /// Current/next indicator.
    pub is_current: bool,
    /// Transport stream id (carried as the table id extension).
    pub transport_stream_id: u16,
    /// Original network id (carried at the start of every section payload).
    pub original_network_id: u16,
    /// Services of the transport stream, keyed by service id. Encoding
    /// walks this map in ascending key order.
    pub services: BTreeMap<u16, Service>,
    is_valid: bool,
}

impl Sdt {
    /// Creates an empty, valid table.
    pub fn new(
        scope: SdtScope,
        version: u8,
        is_current: bool,
        transport_stream_id: u16,
        original_network_id: u16,
    ) -> Self {
        Self {
            scope,
            version,
            is_current,
            transport_stream_id,
            original_network_id,
            services: BTreeMap::new(),
            is_valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            scope: SdtScope::Actual,
            version: 0,
            is_current: false,
            transport_stream_id: 0,
            original_network_id: 0,
            services: BTreeMap::new(),
            is_valid: false,
        }
    }

    /// Whether the table passed validation (always true for tables built in
    /// memory).
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// The table id sections of this table carry.
    pub fn table_id(&self) -> u8 {
        self.scope.table_id()
    }

    /// The service under `service_id`, creating a default entry if absent.
    pub fn service_entry(&mut self, service_id: u16) -> &mut Service {
        self.services.entry(service_id).or_default()
    }

    /// Looks up a service id by service name.
    ///
    /// With `exact` the name must match byte for byte; otherwise matching
    /// ignores case and whitespace. The first match in ascending service id
    /// order wins.
    pub fn find_service(&self, name: &str, exact: bool) -> Option<u16> {
        self.services
            .iter()
            .find(|(_, service)| {
                let service_name = service.service_name();
                if exact {
                    service_name == name
                } else {
                    similar(&service_name, name)
                }
            })
            .map(|(&id, _)| id)
    }

    /// Reassembles a table from a sequence of sections, in the order given.
    ///
    /// Any structural failure (no sections, a malformed section, a foreign
    /// or inconsistent table id, a payload shorter than the constant header)
    /// yields a cleared table with [`is_valid`] false. Version, current flag
    /// and transport stream id are expected to agree across sections but are
    /// not enforced: the last section processed wins, because off-air
    /// encoders are known to disagree with themselves and a hard failure
    /// here would reject otherwise usable tables.
    ///
    /// A service id occurring in several sections accumulates descriptors
    /// into the same entry, which is how a descriptor loop split by the
    /// encoder is put back together. Since every continuation repeats the
    /// 5-byte service header, the flags of the last occurrence win.
    ///
    /// [`is_valid`]: Sdt::is_valid
    pub fn from_sections(sections: &[Section]) -> Self {
        let Some(first) = sections.first() else {
            return Self::invalid();
        };
        let Some(scope) = SdtScope::from_table_id(first.table_id) else {
            return Self::invalid();
        };

        let mut sdt = Self::invalid();
        sdt.scope = scope;

        for section in sections {
            if !section.is_well_formed() || section.table_id != scope.table_id() {
                return Self::invalid();
            }

            sdt.version = section.version;
            sdt.is_current = section.is_current;
            sdt.transport_stream_id = section.table_id_extension;

            let payload = &section.payload;
            if payload.len() < PAYLOAD_HEADER_SIZE {
                return Self::invalid();
            }
            sdt.original_network_id = u16::from_be_bytes([payload[0], payload[1]]);

            let mut data = &payload[PAYLOAD_HEADER_SIZE..];
            while data.len() >= SERVICE_HEADER_SIZE {
                let service_id = u16::from_be_bytes([data[0], data[1]]);
                let flags = ServiceFlags::unpack(data[2]);
                let status = StatusLoopLength::unpack(u16::from_be_bytes([data[3], data[4]]));
                data = &data[SERVICE_HEADER_SIZE..];

                // A loop length pointing past the section is clamped, not
                // rejected.
                let info_length = (status.loop_length as usize).min(data.len());

                let service = sdt.services.entry(service_id).or_default();
                service.eit_schedule = flags.eit_schedule;
                service.eit_present_following = flags.eit_present_following;
                service.running_status = status.running_status;
                service.free_ca_mode = status.free_ca_mode;
                service.descriptors.deserialize_append(&data[..info_length]);
                data = &data[info_length..];
            }
            // Fewer than 5 trailing bytes is padding; drop it silently.
        }

        sdt.is_valid = true;
        sdt
    }

    /// Splits the table into conformant sections.
    ///
    /// Services are emitted in ascending service id order. A service whose
    /// whole entry no longer fits in the open section starts a fresh one; a
    /// descriptor loop too large for even a fresh section spans several,
    /// with the service header repeated at each continuation. An invalid
    /// table yields no sections; a valid one always yields at least one,
    /// even when empty. All sections get the final last-section number in a
    /// closing pass.
    pub fn to_sections(&self) -> EncodingResult<Vec<Section>> {
        let mut sections = Vec::new();
        if !self.is_valid {
            return Ok(sections);
        }

        let mut buf = SectionBuffer::new(MAX_LONG_SECTION_PAYLOAD);
        self.begin_payload(&mut buf)?;

        for (&service_id, service) in &self.services {
            if buf.remaining() < SERVICE_HEADER_SIZE {
                self.flush_section(&mut buf, &mut sections);
            }

            let mut starting = true;
            let mut start_index = 0;
            while starting || start_index < service.descriptors.len() {
                // At the start of an entry, flush when the entire entry will
                // not fit in what remains of a non-empty section. Entries
                // larger than a whole section are left to span sections.
                if starting
                    && buf.len() > PAYLOAD_HEADER_SIZE
                    && SERVICE_HEADER_SIZE + service.descriptors.serialized_size()
                        > buf.remaining()
                {
                    self.flush_section(&mut buf, &mut sections);
                }
                starting = false;

                buf.put_u16(service_id)?;
                buf.put_u8(
                    ServiceFlags {
                        eit_schedule: service.eit_schedule,
                        eit_present_following: service.eit_present_following,
                    }
                    .pack(),
                )?;

                // Placeholder for the status/loop-length pair, patched once
                // this section's share of the loop is known.
                let loop_length_at = buf.len();
                buf.put_u16(0)?;

                let loop_start = buf.len();
                start_index = service.descriptors.serialize_partial(&mut buf, start_index)?;
                buf.patch_u16(
                    loop_length_at,
                    StatusLoopLength {
                        running_status: service.running_status,
                        free_ca_mode: service.free_ca_mode,
                        loop_length: (buf.len() - loop_start) as u16,
                    }
                    .pack(),
                )?;

                if start_index < service.descriptors.len() {
                    self.flush_section(&mut buf, &mut sections);
                }
            }
        }

        if buf.len() > PAYLOAD_HEADER_SIZE || sections.is_empty() {
            self.flush_section(&mut buf, &mut sections);
        }

        let last = sections.len().saturating_sub(1) as u8;
        for section in &mut sections {
            section.last_section_number = last;
        }
        Ok(sections)
    }

    /// Writes the constant payload header: original network id plus one
    /// reserved byte.
    fn begin_payload(&self, buf: &mut SectionBuffer) -> EncodingResult<()> {
        buf.put_u16(self.original_network_id)?;
        buf.put_u8(0xFF)
    }

    /// Emits the working buffer as the next section and rewinds it to the
    /// constant payload header.
    fn flush_section(&self, buf: &mut SectionBuffer, sections: &mut Vec<Section>) {
        let number = sections.len() as u8;
        sections.push(Section {
            table_id: self.table_id(),
            table_id_extension: self.transport_stream_id,
            version: self.version,
            is_current: self.is_current,
            section_number: number,
            last_section_number: number,
            payload: buf.as_slice().to_vec(),
        });
        buf.truncate(PAYLOAD_HEADER_SIZE);
    }
}
