//! Builder API for constructing SDTs with validation.
//!
//! The plain types accept whatever they are given; the builders are the
//! place where range rules (5-bit version, 3-bit running status, descriptor
//! payload limits) are enforced before a table ever reaches the encoder.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::descriptor::Descriptor;
use crate::flags::RunningStatus;
use crate::sdt::{Sdt, SdtScope, Service};

/// Errors that can occur while building a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// A field value is outside its wire range.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The same service id was added twice.
    #[error("duplicate service id 0x{0:04X}")]
    DuplicateServiceId(u16),

    /// Provider and service name do not fit one service descriptor.
    #[error("provider and name of {total} bytes exceed the descriptor payload limit")]
    NamesTooLong {
        /// Combined payload size the names would need.
        total: usize,
    },
}

/// Result type for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Builder for a complete [`Sdt`].
#[derive(Debug)]
pub struct SdtBuilder {
    scope: SdtScope,
    version: u8,
    is_current: bool,
    transport_stream_id: u16,
    original_network_id: u16,
    services: Vec<(u16, Service)>,
}

impl SdtBuilder {
    /// Creates a builder for a table of the given scope.
    pub fn new(scope: SdtScope) -> Self {
        Self {
            scope,
            version: 0,
            is_current: true,
            transport_stream_id: 0,
            original_network_id: 0,
            services: Vec::new(),
        }
    }

    /// Sets the version number (5-bit, validated in [`build`]).
    ///
    /// [`build`]: SdtBuilder::build
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Sets the current/next indicator.
    pub fn current(mut self, is_current: bool) -> Self {
        self.is_current = is_current;
        self
    }

    /// Sets the transport stream id.
    pub fn transport_stream_id(mut self, transport_stream_id: u16) -> Self {
        self.transport_stream_id = transport_stream_id;
        self
    }

    /// Sets the original network id.
    pub fn original_network_id(mut self, original_network_id: u16) -> Self {
        self.original_network_id = original_network_id;
        self
    }

    /// Adds a service under `service_id`.
    pub fn service(mut self, service_id: u16, service: Service) -> Self {
        self.services.push((service_id, service));
        self
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// Returns an error when the version exceeds 31 or a service id occurs
    /// twice.
    pub fn build(self) -> BuilderResult<Sdt> {
        if self.version > 31 {
            return Err(BuilderError::InvalidValue {
                field: "version",
                reason: format!("{} exceeds the 5-bit maximum of 31", self.version),
            });
        }

        let mut services = BTreeMap::new();
        for (service_id, service) in self.services {
            if services.insert(service_id, service).is_some() {
                return Err(BuilderError::DuplicateServiceId(service_id));
            }
        }

        let mut sdt = Sdt::new(
            self.scope,
            self.version,
            self.is_current,
            self.transport_stream_id,
            self.original_network_id,
        );
        sdt.services = services;
        Ok(sdt)
    }
}

/// Builder for one [`Service`].
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    eit_schedule: bool,
    eit_present_following: bool,
    running_status: RunningStatus,
    free_ca_mode: bool,
    service_type: u8,
    provider: Option<String>,
    name: Option<String>,
    descriptors: Vec<Descriptor>,
}

impl ServiceBuilder {
    /// Creates a builder with all flags clear and no descriptors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the EIT schedule flag.
    pub fn eit_schedule(mut self, present: bool) -> Self {
        self.eit_schedule = present;
        self
    }

    /// Sets the EIT present/following flag.
    pub fn eit_present_following(mut self, present: bool) -> Self {
        self.eit_present_following = present;
        self
    }

    /// Sets the running status.
    pub fn running_status(mut self, running_status: RunningStatus) -> Self {
        self.running_status = running_status;
        self
    }

    /// Sets the free-CA mode flag.
    pub fn free_ca_mode(mut self, controlled: bool) -> Self {
        self.free_ca_mode = controlled;
        self
    }

    /// Sets the service type for the synthesized service descriptor.
    pub fn service_type(mut self, service_type: u8) -> Self {
        self.service_type = service_type;
        self
    }

    /// Sets the provider name for the synthesized service descriptor.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the service name for the synthesized service descriptor.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a descriptor to the service's descriptor loop.
    pub fn add_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Builds the service, synthesizing a service descriptor when a name or
    /// provider was given.
    ///
    /// # Errors
    ///
    /// Returns an error when provider and name do not fit one descriptor
    /// payload.
    pub fn build(self) -> BuilderResult<Service> {
        let mut service = Service {
            eit_schedule: self.eit_schedule,
            eit_present_following: self.eit_present_following,
            running_status: self.running_status,
            free_ca_mode: self.free_ca_mode,
            descriptors: self.descriptors.into_iter().collect(),
        };

        if self.provider.is_some() || self.name.is_some() {
            let provider = self.provider.unwrap_or_default();
            let name = self.name.unwrap_or_default();
            let total = 3 + provider.len() + name.len();
            if total > 255 {
                return Err(BuilderError::NamesTooLong { total });
            }
            service
                .set_provider(&provider, self.service_type)
                .and_then(|_| service.set_name(&name, self.service_type))
                .map_err(|e| BuilderError::InvalidValue {
                    field: "service_descriptor",
                    reason: e.to_string(),
                })?;
        }

        Ok(service)
    }
}
