//! DVB descriptors and descriptor lists.
//!
//! A descriptor is the extensible field mechanism of SI tables: one tag byte,
//! one length byte and an opaque payload. This module treats every descriptor
//! as an atomic unit; interpreting a payload is left to the code that knows
//! the tag (the SDT service helpers interpret tag 0x48 themselves).

use crate::buffer::{EncodingError, EncodingResult, SectionBuffer};

/// Well-known DVB descriptor tags used with the SDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorTag {
    /// network_name_descriptor (0x40).
    NetworkName,
    /// service_list_descriptor (0x41).
    ServiceList,
    /// service_descriptor (0x48).
    Service,
    /// linkage_descriptor (0x4A).
    Linkage,
    /// short_event_descriptor (0x4D).
    ShortEvent,
    /// stream_identifier_descriptor (0x52).
    StreamIdentifier,
    /// CA_identifier_descriptor (0x53).
    CaIdentifier,
    /// private_data_specifier_descriptor (0x5F).
    PrivateDataSpecifier,
    /// Any other tag value.
    Other(u8),
}

impl From<u8> for DescriptorTag {
    fn from(value: u8) -> Self {
        match value {
            0x40 => DescriptorTag::NetworkName,
            0x41 => DescriptorTag::ServiceList,
            0x48 => DescriptorTag::Service,
            0x4A => DescriptorTag::Linkage,
            0x4D => DescriptorTag::ShortEvent,
            0x52 => DescriptorTag::StreamIdentifier,
            0x53 => DescriptorTag::CaIdentifier,
            0x5F => DescriptorTag::PrivateDataSpecifier,
            _ => DescriptorTag::Other(value),
        }
    }
}

impl From<DescriptorTag> for u8 {
    fn from(value: DescriptorTag) -> Self {
        match value {
            DescriptorTag::NetworkName => 0x40,
            DescriptorTag::ServiceList => 0x41,
            DescriptorTag::Service => 0x48,
            DescriptorTag::Linkage => 0x4A,
            DescriptorTag::ShortEvent => 0x4D,
            DescriptorTag::StreamIdentifier => 0x52,
            DescriptorTag::CaIdentifier => 0x53,
            DescriptorTag::PrivateDataSpecifier => 0x5F,
            DescriptorTag::Other(value) => value,
        }
    }
}

/// A single descriptor: tag byte, length byte, opaque payload.
///
/// Descriptors are atomic: the segmentation engine never splits one across
/// sections, it moves the whole descriptor to the next section instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    tag: u8,
    payload: Vec<u8>,
}

impl Descriptor {
    /// Creates a descriptor, rejecting payloads the length byte cannot hold.
    pub fn new(tag: impl Into<u8>, payload: Vec<u8>) -> EncodingResult<Self> {
        if payload.len() > 255 {
            return Err(EncodingError::PayloadTooLong {
                len: payload.len(),
            });
        }
        Ok(Self {
            tag: tag.into(),
            payload,
        })
    }

    /// The descriptor tag byte.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// The opaque payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Encoded size: two header bytes plus the payload.
    pub fn serialized_size(&self) -> usize {
        2 + self.payload.len()
    }

    /// Replaces the payload, subject to the same length limit as [`new`].
    ///
    /// [`new`]: Descriptor::new
    pub fn replace_payload(&mut self, payload: Vec<u8>) -> EncodingResult<()> {
        if payload.len() > 255 {
            return Err(EncodingError::PayloadTooLong {
                len: payload.len(),
            });
        }
        self.payload = payload;
        Ok(())
    }

    /// Writes the tag, length and payload into the buffer.
    pub fn write_to(&self, buf: &mut SectionBuffer) -> EncodingResult<()> {
        buf.put_u8(self.tag)?;
        buf.put_u8(self.payload.len() as u8)?;
        buf.put_bytes(&self.payload)
    }

    /// Parses one descriptor from the front of `bytes`.
    ///
    /// Returns the descriptor and the number of bytes consumed, or `None`
    /// when fewer than two header bytes remain. A declared length that runs
    /// past the end of the input is clamped to what is actually there;
    /// truncated descriptors are a routine condition in off-air data.
    pub fn parse(bytes: &[u8]) -> Option<(Descriptor, usize)> {
        if bytes.len() < 2 {
            return None;
        }
        let tag = bytes[0];
        let declared = bytes[1] as usize;
        let available = bytes.len() - 2;
        let length = declared.min(available);
        let descriptor = Descriptor {
            tag,
            payload: bytes[2..2 + length].to_vec(),
        };
        Some((descriptor, 2 + length))
    }
}

/// An ordered list of descriptors.
///
/// Order matters: lookups return the first match, and the serialized byte
/// order is the list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorList {
    descriptors: Vec<Descriptor>,
}

impl DescriptorList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of descriptors in the list.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the list holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The descriptor at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Descriptor> {
        self.descriptors.get(index)
    }

    /// Mutable access to the descriptor at `index`, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(index)
    }

    /// Appends a descriptor.
    pub fn push(&mut self, descriptor: Descriptor) {
        self.descriptors.push(descriptor);
    }

    /// Iterates over the descriptors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// Total encoded size of all descriptors in bytes.
    pub fn serialized_size(&self) -> usize {
        self.descriptors.iter().map(Descriptor::serialized_size).sum()
    }

    /// Index of the first descriptor with the given tag.
    pub fn find_first(&self, tag: impl Into<u8>) -> Option<usize> {
        let tag = tag.into();
        self.descriptors.iter().position(|d| d.tag == tag)
    }

    /// Serializes descriptors starting at `start_index` into `buf`, stopping
    /// before the first one that does not fit in the remaining space.
    ///
    /// Returns the index of the first descriptor that was not written, equal
    /// to [`len`] when all of them were. The caller resumes from that index
    /// in a fresh section; a fresh section always has room for at least one
    /// maximal descriptor, so the resumption makes progress.
    ///
    /// [`len`]: DescriptorList::len
    pub fn serialize_partial(
        &self,
        buf: &mut SectionBuffer,
        start_index: usize,
    ) -> EncodingResult<usize> {
        let mut index = start_index;
        while index < self.descriptors.len() {
            let descriptor = &self.descriptors[index];
            if descriptor.serialized_size() > buf.remaining() {
                break;
            }
            descriptor.write_to(buf)?;
            index += 1;
        }
        Ok(index)
    }

    /// The complete encoded descriptor loop as one byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        for descriptor in &self.descriptors {
            bytes.push(descriptor.tag);
            bytes.push(descriptor.payload.len() as u8);
            bytes.extend_from_slice(&descriptor.payload);
        }
        bytes
    }

    /// Parses a contiguous run of descriptors from `bytes` and appends them.
    ///
    /// A final descriptor whose declared length exceeds the remaining bytes
    /// is kept with its payload clamped rather than rejected; a trailing
    /// lone byte (no room for a header) is discarded.
    pub fn deserialize_append(&mut self, mut bytes: &[u8]) {
        while let Some((descriptor, consumed)) = Descriptor::parse(bytes) {
            self.descriptors.push(descriptor);
            bytes = &bytes[consumed..];
        }
    }
}

impl<'a> IntoIterator for &'a DescriptorList {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl FromIterator<Descriptor> for DescriptorList {
    fn from_iter<T: IntoIterator<Item = Descriptor>>(iter: T) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}
