//! FlightInfo construction
//!
//! Projects a [`Dataset`] into the discovery record clients see. The ticket in
//! every endpoint is the dataset key as UTF-8, so the key, the ticket and the
//! first descriptor path segment always name the same dataset.

use std::sync::Arc;

use arrow_flight::{FlightDescriptor, FlightEndpoint, FlightInfo, Ticket};

use crate::storage::Dataset;
use crate::Result;

/// Builds `FlightInfo` records against a fixed set of advertised locations.
#[derive(Debug, Clone)]
pub struct FlightInfoBuilder {
    /// Bind location first, then any extra advertised locations
    locations: Arc<[String]>,
}

impl FlightInfoBuilder {
    pub fn new(locations: impl Into<Arc<[String]>>) -> Self {
        Self {
            locations: locations.into(),
        }
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Ticket for a dataset: the UTF-8 bytes of its key
    pub fn ticket(dataset: &Dataset) -> Ticket {
        Ticket::new(dataset.key().as_bytes().to_vec())
    }

    /// Descriptor addressing a dataset by path `[key]`
    pub fn descriptor(dataset: &Dataset) -> FlightDescriptor {
        FlightDescriptor::new_path(vec![dataset.key().to_string()])
    }

    /// Build the discovery record for `dataset`, echoing `descriptor`.
    ///
    /// One endpoint carries the ticket and every advertised location.
    /// `total_bytes` is 0 when the dataset size was never measured.
    pub fn build(&self, dataset: &Dataset, descriptor: FlightDescriptor) -> Result<FlightInfo> {
        let endpoint = self
            .locations
            .iter()
            .fold(FlightEndpoint::new().with_ticket(Self::ticket(dataset)), |ep, loc| {
                ep.with_location(loc.as_str())
            });

        let info = FlightInfo::new()
            .try_with_schema(dataset.schema())?
            .with_descriptor(descriptor)
            .with_endpoint(endpoint)
            .with_total_records(clamp_i64(dataset.row_count()))
            .with_total_bytes(dataset.byte_size().map(clamp_i64).unwrap_or(0))
            .with_ordered(true);

        Ok(info)
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
