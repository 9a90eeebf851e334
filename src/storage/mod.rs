//! Storage layer - the in-memory dataset catalog
//!
//! ```text
//! DatasetRegistry
//!   ├── "people" → Dataset { schema, batches, row_count, byte_size }
//!   └── ...
//! ```
//!
//! Built once before serving; nothing here is mutated afterwards.

pub mod dataset;
pub mod registry;
pub mod seed;

pub use dataset::{Dataset, DatasetBatches};
pub use registry::DatasetRegistry;
