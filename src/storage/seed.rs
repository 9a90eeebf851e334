//! Startup dataset set

use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};

use super::{Dataset, DatasetRegistry};
use crate::Result;

/// `people`: name (Utf8), age (Int64), three rows
pub fn people() -> Result<Dataset> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("age", DataType::Int64, true),
    ]));

    let names: ArrayRef = Arc::new(StringArray::from(vec!["Alice", "Bob", "Charlie"]));
    let ages: ArrayRef = Arc::new(Int64Array::from(vec![25, 30, 35]));

    let batch = RecordBatch::try_new(schema, vec![names, ages])?;
    Dataset::from_batch("people", batch)
}

/// Registry holding the built-in datasets
pub fn default_registry() -> Result<DatasetRegistry> {
    let mut registry = DatasetRegistry::new();
    registry.register(people()?)?;
    Ok(registry)
}
