//! Dataset - an immutable named table held by the catalog

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use crate::{Error, Result};

/// An immutable, schema-bearing table registered under a unique key.
///
/// Rows are held as Arrow `RecordBatch`es in the order they were supplied.
/// Every batch shares the dataset schema (checked on construction).
#[derive(Debug, Clone)]
pub struct Dataset {
    key: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    row_count: u64,
    /// `None` until measured; reported to clients as 0 ("unknown")
    byte_size: Option<u64>,
}

impl Dataset {
    /// Build a dataset from batches that all match `schema`.
    pub fn try_new(
        key: impl Into<String>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::MalformedRequest("dataset key must not be empty".to_string()));
        }

        for (index, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(Error::SchemaMismatch { key, index });
            }
        }

        let row_count = batches.iter().map(|b| b.num_rows() as u64).sum();

        Ok(Self {
            key,
            schema,
            batches,
            row_count,
            byte_size: None,
        })
    }

    /// Build a single-batch dataset; the schema is taken from the batch.
    pub fn from_batch(key: impl Into<String>, batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        Self::try_new(key, schema, vec![batch])
    }

    /// Record a known byte size.
    pub fn with_byte_size(mut self, bytes: u64) -> Self {
        self.byte_size = Some(bytes);
        self
    }

    /// Record the in-memory size of all batches as the byte size.
    pub fn measure_byte_size(self) -> Self {
        let bytes = self
            .batches
            .iter()
            .map(|b| b.get_array_memory_size() as u64)
            .sum();
        self.with_byte_size(bytes)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Byte size if it has been computed
    pub fn byte_size(&self) -> Option<u64> {
        self.byte_size
    }

    /// Lazily walk the rows as batches of at most `max_rows` rows.
    ///
    /// Slices are zero-copy views into the stored batches.
    pub fn stream_batches(self: &Arc<Self>, max_rows: usize) -> DatasetBatches {
        DatasetBatches {
            dataset: Arc::clone(self),
            batch: 0,
            offset: 0,
            max_rows: max_rows.max(1),
        }
    }
}

/// Forward-only iterator over a dataset's rows, re-chunked to a row limit.
///
/// Holds only an `Arc` to the dataset. Dropping it mid-way releases
/// everything; a fresh call to [`Dataset::stream_batches`] starts over.
#[derive(Debug)]
pub struct DatasetBatches {
    dataset: Arc<Dataset>,
    batch: usize,
    offset: usize,
    max_rows: usize,
}

impl DatasetBatches {
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(self.dataset.schema())
    }
}

impl Iterator for DatasetBatches {
    type Item = RecordBatch;

    fn next(&mut self) -> Option<RecordBatch> {
        loop {
            let current = self.dataset.batches.get(self.batch)?;
            let remaining = current.num_rows() - self.offset;
            if remaining == 0 {
                self.batch += 1;
                self.offset = 0;
                continue;
            }

            let len = remaining.min(self.max_rows);
            let slice = current.slice(self.offset, len);
            self.offset += len;
            return Some(slice);
        }
    }
}
