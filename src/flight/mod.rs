//! Arrow Flight dataset gateway
//!
//! Discovery and retrieval of registered datasets over Arrow Flight.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Flight Client                                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼ Arrow Flight (gRPC)
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  HangarFlightService                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ListFlights(criteria) → FlightInfo per dataset (lazy)           │
//! │  GetFlightInfo(path)   → FlightInfo for path[0]                  │
//! │  DoGet(ticket)         → Stream dataset rows as RecordBatches    │
//! │  GetSchema(path)       → Dataset schema only                     │
//! │  DoAction(action)      → Catalog introspection (JSON)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod actions;
mod handler;
mod info;
mod server;

pub use actions::{
    action_types, execute_action, ColumnSummary, DatasetSummary, DESCRIBE, LIST_DATASETS,
};
pub use handler::{
    descriptor_key, ticket_key, BatchStream, CatalogHandler, FlightHandler, FlightListing,
    DEFAULT_BATCH_ROWS,
};
pub use info::FlightInfoBuilder;
pub use server::HangarFlightService;
