//! Dataset registry
//!
//! Maps dataset keys to datasets. Populated once at startup and read-only
//! while serving, so lookups take no lock. Keys are listed in insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::dataset::Dataset;
use crate::{Error, Result};

/// Catalog of registered datasets
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    /// key → position in `datasets`
    index: HashMap<String, usize>,
    /// Insertion-ordered entries
    datasets: Vec<Arc<Dataset>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under its own key.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is taken.
    pub fn register(&mut self, dataset: Dataset) -> Result<()> {
        if self.index.contains_key(dataset.key()) {
            return Err(Error::DuplicateKey {
                key: dataset.key().to_string(),
            });
        }

        info!(
            key = dataset.key(),
            rows = dataset.row_count(),
            columns = dataset.schema().fields().len(),
            "Registered dataset"
        );

        self.index.insert(dataset.key().to_string(), self.datasets.len());
        self.datasets.push(Arc::new(dataset));
        Ok(())
    }

    /// Look up a dataset by key.
    pub fn lookup(&self, key: &str) -> Result<Arc<Dataset>> {
        self.get(key).cloned().ok_or_else(|| Error::not_found(key))
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Dataset>> {
        self.index.get(key).map(|&i| &self.datasets[i])
    }

    /// All keys, in registration order.
    pub fn list_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.datasets.iter().map(|d| d.key())
    }

    /// Dataset at a registration position
    pub fn get_index(&self, position: usize) -> Option<&Arc<Dataset>> {
        self.datasets.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Dataset>> + '_ {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
