//! JSON serialization of tables, sections and descriptors.
//!
//! Opaque byte payloads are rendered as lowercase hex strings; everything
//! else maps to plain JSON fields. Only serialization is provided: the
//! canonical way back into the types is the binary section codec, not JSON.

use data_encoding::HEXLOWER;
use serde::ser::SerializeMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::descriptor::{Descriptor, DescriptorList};
use crate::fmt::running_status_name;
use crate::sdt::{Sdt, SdtScope, Service};
use crate::section::Section;

impl Serialize for SdtScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SdtScope::Actual => serializer.serialize_str("actual"),
            SdtScope::Other => serializer.serialize_str("other"),
        }
    }
}

impl Serialize for Descriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Descriptor", 3)?;
        state.serialize_field("tag", &format!("0x{:02x}", self.tag()))?;
        state.serialize_field("length", &self.payload_size())?;
        state.serialize_field("data", &HEXLOWER.encode(self.payload()))?;
        state.end()
    }
}

impl Serialize for DescriptorList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl Serialize for Service {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Service", 9)?;
        state.serialize_field("eit_schedule", &self.eit_schedule)?;
        state.serialize_field("eit_present_following", &self.eit_present_following)?;
        state.serialize_field("running_status", running_status_name(self.running_status))?;
        state.serialize_field("free_ca_mode", &self.free_ca_mode)?;
        state.serialize_field("service_type", &self.service_type())?;
        state.serialize_field("provider_name", &self.provider_name())?;
        state.serialize_field("service_name", &self.service_name())?;
        state.serialize_field("descriptor_count", &self.descriptors.len())?;
        state.serialize_field("descriptors", &self.descriptors)?;
        state.end()
    }
}

impl Serialize for Sdt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct ServiceMap<'a>(&'a Sdt);

        impl Serialize for ServiceMap<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.services.len()))?;
                for (id, service) in &self.0.services {
                    map.serialize_entry(&format!("0x{id:04x}"), service)?;
                }
                map.end()
            }
        }

        let mut state = serializer.serialize_struct("Sdt", 8)?;
        state.serialize_field("scope", &self.scope)?;
        state.serialize_field("table_id", &format!("0x{:02x}", self.table_id()))?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("is_current", &self.is_current)?;
        state.serialize_field("transport_stream_id", &self.transport_stream_id)?;
        state.serialize_field("original_network_id", &self.original_network_id)?;
        state.serialize_field("service_count", &self.services.len())?;
        state.serialize_field("services", &ServiceMap(self))?;
        state.end()
    }
}

impl Serialize for Section {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Section", 7)?;
        state.serialize_field("table_id", &format!("0x{:02x}", self.table_id))?;
        state.serialize_field("table_id_extension", &self.table_id_extension)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("is_current", &self.is_current)?;
        state.serialize_field("section_number", &self.section_number)?;
        state.serialize_field("last_section_number", &self.last_section_number)?;
        state.serialize_field("payload", &HEXLOWER.encode(&self.payload))?;
        state.end()
    }
}
