//! # Hangar
//!
//! Read-only Arrow Flight gateway over a static catalog of named datasets.
//!
//! ## Quick Start
//! ```rust,ignore
//! use std::sync::Arc;
//! use hangar::{CatalogHandler, HangarFlightService, storage::seed};
//!
//! let registry = Arc::new(seed::default_registry()?);
//! let handler = CatalogHandler::new(registry, vec!["grpc+tcp://0.0.0.0:8815".into()]);
//! let service = HangarFlightService::new(handler).into_server();
//! ```
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HANGAR                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   tonic gRPC  → HangarFlightService (Status mapping)            │
//! │                         ↓                                        │
//! │   FlightHandler → CatalogHandler                                 │
//! │     list_flights / get_flight_info / do_get                      │
//! │                         ↓                                        │
//! │   FlightInfoBuilder    DatasetRegistry → Dataset (RecordBatch)   │
//! │                                                                  │
//! │   key == ticket bytes == descriptor.path[0]                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod flight;
pub mod storage;

pub use crate::config::{LogFormat, ServerConfig};
pub use crate::flight::{
    BatchStream, CatalogHandler, FlightHandler, FlightInfoBuilder, FlightListing,
    HangarFlightService,
};
pub use crate::storage::{Dataset, DatasetRegistry};

// === Error types ===

/// Crate-level error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Dataset not found: {key}")]
    NotFound { key: String },

    #[error("Dataset already registered: {key}")]
    DuplicateKey { key: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Schema mismatch in dataset {key}: batch {index} does not match the declared schema")]
    SchemaMismatch { key: String, index: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Flight error: {0}")]
    Flight(#[from] arrow_flight::error::FlightError),
}

impl Error {
    /// Shorthand for a not-found error on `key`
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// True for the client-side request errors (not found, malformed)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::MalformedRequest(_))
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { key } => tonic::Status::not_found(format!("Dataset {key} not found")),
            Error::DuplicateKey { key } => {
                tonic::Status::already_exists(format!("Dataset {key} already registered"))
            }
            Error::MalformedRequest(msg) => tonic::Status::invalid_argument(msg),
            Error::Config(msg) => tonic::Status::invalid_argument(msg),
            Error::Transport(e) => tonic::Status::unavailable(e.to_string()),
            Error::Flight(e) => e.into(),
            e @ (Error::SchemaMismatch { .. } | Error::Arrow(_) | Error::Json(_) | Error::Io(_)) => {
                tonic::Status::internal(e.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// === Constants ===

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Flight port
pub const DEFAULT_PORT: u16 = 8815;
