//! Protocol operations over the dataset registry
//!
//! [`FlightHandler`] is the three-operation contract (list, resolve, fetch)
//! the gRPC adapter calls into. It speaks domain types and [`crate::Error`];
//! turning errors into `tonic::Status` happens in the server module.

use std::sync::Arc;

use arrow_flight::flight_descriptor::DescriptorType;
use arrow_flight::{Criteria, FlightDescriptor, FlightInfo, Ticket};
use tracing::debug;

use super::info::FlightInfoBuilder;
use crate::storage::{Dataset, DatasetBatches, DatasetRegistry};
use crate::{Error, Result};

/// Default rows per streamed batch
pub const DEFAULT_BATCH_ROWS: usize = 64 * 1024;

/// Row stream returned by `do_get`
pub type BatchStream = DatasetBatches;

/// Discovery and retrieval operations of a dataset gateway
pub trait FlightHandler: Send + Sync {
    /// Enumerate every dataset. Criteria are accepted but not applied.
    fn list_flights(&self, criteria: &Criteria) -> FlightListing;

    /// Resolve a path descriptor to its discovery record.
    fn get_flight_info(&self, descriptor: FlightDescriptor) -> Result<FlightInfo>;

    /// Open the row stream for a ticket.
    fn do_get(&self, ticket: &Ticket) -> Result<BatchStream>;
}

// =============================================================================
// CATALOG HANDLER
// =============================================================================

/// [`FlightHandler`] backed by a [`DatasetRegistry`]
#[derive(Debug, Clone)]
pub struct CatalogHandler {
    registry: Arc<DatasetRegistry>,
    info: FlightInfoBuilder,
    max_batch_rows: usize,
}

impl CatalogHandler {
    /// `locations` are advertised in every endpoint; the bind location goes first.
    pub fn new(registry: Arc<DatasetRegistry>, locations: Vec<String>) -> Self {
        Self {
            registry,
            info: FlightInfoBuilder::new(locations),
            max_batch_rows: DEFAULT_BATCH_ROWS,
        }
    }

    pub fn with_max_batch_rows(mut self, rows: usize) -> Self {
        self.max_batch_rows = rows.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<DatasetRegistry> {
        &self.registry
    }

    pub fn locations(&self) -> &[String] {
        self.info.locations()
    }

    /// Resolve a descriptor to its registered dataset.
    ///
    /// Only path descriptors are accepted; the first segment is the key.
    pub fn resolve_descriptor(&self, descriptor: &FlightDescriptor) -> Result<Arc<Dataset>> {
        let key = descriptor_key(descriptor)?;
        self.registry.lookup(key)
    }

    /// Resolve a ticket (UTF-8 key) to its registered dataset.
    pub fn resolve_ticket(&self, ticket: &Ticket) -> Result<Arc<Dataset>> {
        let key = ticket_key(ticket)?;
        self.registry.lookup(key)
    }
}

impl FlightHandler for CatalogHandler {
    fn list_flights(&self, criteria: &Criteria) -> FlightListing {
        if !criteria.expression.is_empty() {
            debug!(
                criteria_len = criteria.expression.len(),
                "Ignoring list_flights criteria"
            );
        }
        FlightListing {
            registry: Arc::clone(&self.registry),
            info: self.info.clone(),
            position: 0,
        }
    }

    fn get_flight_info(&self, descriptor: FlightDescriptor) -> Result<FlightInfo> {
        let dataset = self.resolve_descriptor(&descriptor)?;
        debug!(key = dataset.key(), rows = dataset.row_count(), "Resolved flight info");
        self.info.build(&dataset, descriptor)
    }

    fn do_get(&self, ticket: &Ticket) -> Result<BatchStream> {
        let dataset = self.resolve_ticket(ticket)?;
        debug!(
            key = dataset.key(),
            rows = dataset.row_count(),
            max_batch_rows = self.max_batch_rows,
            "Streaming dataset"
        );
        Ok(dataset.stream_batches(self.max_batch_rows))
    }
}

// =============================================================================
// LISTING
// =============================================================================

/// Lazy enumeration of every registered dataset's `FlightInfo`.
///
/// Each item is built when pulled. A listing is not resumable; call
/// `list_flights` again to re-enumerate.
#[derive(Debug)]
pub struct FlightListing {
    registry: Arc<DatasetRegistry>,
    info: FlightInfoBuilder,
    position: usize,
}

impl Iterator for FlightListing {
    type Item = Result<FlightInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let dataset = self.registry.get_index(self.position)?;
        self.position += 1;
        Some(self.info.build(dataset, FlightInfoBuilder::descriptor(dataset)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.registry.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

// =============================================================================
// REQUEST DECODING
// =============================================================================

/// Dataset key named by a path descriptor.
pub fn descriptor_key(descriptor: &FlightDescriptor) -> Result<&str> {
    if descriptor.r#type() != DescriptorType::Path {
        return Err(Error::MalformedRequest(
            "only path descriptors are supported".to_string(),
        ));
    }

    match descriptor.path.first() {
        Some(key) if !key.is_empty() => Ok(key.as_str()),
        _ => Err(Error::MalformedRequest(
            "descriptor path must name a dataset".to_string(),
        )),
    }
}

/// Dataset key carried by a ticket.
pub fn ticket_key(ticket: &Ticket) -> Result<&str> {
    std::str::from_utf8(&ticket.ticket)
        .map_err(|_| Error::MalformedRequest("Invalid UTF-8 in ticket".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::seed;
    use arrow_array::{Int64Array, RecordBatch, StringArray};
    use arrow_schema::{DataType, Field, Schema};

    const LOCATION: &str = "grpc+tcp://0.0.0.0:8815";

    fn handler() -> CatalogHandler {
        let registry = Arc::new(seed::default_registry().unwrap());
        CatalogHandler::new(registry, vec![LOCATION.to_string()])
    }

    fn two_datasets() -> CatalogHandler {
        let mut registry = seed::default_registry().unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from_iter_values(0..10))],
        )
        .unwrap();
        registry.register(Dataset::from_batch("ids", batch).unwrap()).unwrap();
        CatalogHandler::new(Arc::new(registry), vec![LOCATION.to_string()])
    }

    fn path(key: &str) -> FlightDescriptor {
        FlightDescriptor::new_path(vec![key.to_string()])
    }

    #[test]
    fn test_list_flights_one_per_dataset() {
        let handler = two_datasets();
        let infos: Vec<FlightInfo> = handler
            .list_flights(&Criteria::default())
            .collect::<Result<_>>()
            .unwrap();

        let keys: Vec<&str> = infos
            .iter()
            .map(|i| i.flight_descriptor.as_ref().unwrap().path[0].as_str())
            .collect();
        assert_eq!(keys, vec!["people", "ids"]);
        assert_eq!(infos[0].total_records, 3);
        assert_eq!(infos[1].total_records, 10);
    }

    #[test]
    fn test_list_flights_ignores_criteria() {
        let handler = handler();
        let criteria = Criteria {
            expression: bytes::Bytes::from_static(b"name = 'nothing'"),
        };
        assert_eq!(handler.list_flights(&criteria).count(), 1);
    }

    #[test]
    fn test_list_flights_restarts_per_call() {
        let handler = two_datasets();
        let mut listing = handler.list_flights(&Criteria::default());
        assert_eq!(listing.size_hint(), (2, Some(2)));
        listing.next();
        drop(listing);

        let again: Vec<FlightInfo> = handler
            .list_flights(&Criteria::default())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_list_flights_empty_registry() {
        let handler = CatalogHandler::new(Arc::new(DatasetRegistry::new()), vec![]);
        assert_eq!(handler.list_flights(&Criteria::default()).count(), 0);
    }

    #[test]
    fn test_get_flight_info_matches_listing() {
        let handler = handler();
        let listed = handler
            .list_flights(&Criteria::default())
            .next()
            .unwrap()
            .unwrap();
        let resolved = handler.get_flight_info(path("people")).unwrap();

        assert_eq!(listed, resolved);
        assert_eq!(resolved.endpoint[0].location[0].uri, LOCATION);
    }

    #[test]
    fn test_get_flight_info_not_found() {
        let err = handler().get_flight_info(path("nonexistent")).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref key } if key == "nonexistent"));
    }

    #[test]
    fn test_get_flight_info_malformed() {
        let handler = handler();

        let empty = FlightDescriptor::new_path(vec![]);
        assert!(matches!(
            handler.get_flight_info(empty),
            Err(Error::MalformedRequest(_))
        ));

        let cmd = FlightDescriptor::new_cmd(b"people".to_vec());
        assert!(matches!(
            handler.get_flight_info(cmd),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_extra_path_segments_ignored() {
        let descriptor = FlightDescriptor::new_path(vec!["people".into(), "extra".into()]);
        let info = handler().get_flight_info(descriptor.clone()).unwrap();
        assert_eq!(info.flight_descriptor, Some(descriptor));
        assert_eq!(info.total_records, 3);
    }

    #[test]
    fn test_do_get_streams_rows_in_order() {
        let handler = handler().with_max_batch_rows(2);
        let batches: Vec<RecordBatch> = handler.do_get(&Ticket::new("people")).unwrap().collect();

        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 3);
        let names: Vec<String> = batches
            .iter()
            .flat_map(|b| {
                let col = b.column(0).as_any().downcast_ref::<StringArray>().unwrap();
                col.iter().map(|v| v.unwrap().to_string()).collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
    }

    #[test]
    fn test_do_get_not_found() {
        let err = handler().do_get(&Ticket::new("nonexistent")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_do_get_invalid_utf8() {
        let err = handler().do_get(&Ticket::new(vec![0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn test_key_ticket_path_equivalence() {
        let handler = two_datasets();
        for key in handler.registry().list_keys() {
            let info = handler.get_flight_info(path(key)).unwrap();
            let ticket = info.endpoint[0].ticket.clone().unwrap();
            let rows: usize = handler.do_get(&ticket).unwrap().map(|b| b.num_rows()).sum();
            assert_eq!(rows as i64, info.total_records);
        }
    }
}
