//! Catalog actions for Arrow Flight
//!
//! Read-only introspection over Flight DoAction. Results are JSON.

use arrow_flight::ActionType;
use serde::{Deserialize, Serialize};

use crate::storage::{Dataset, DatasetRegistry};
use crate::{Error, Result};

/// Summaries of every dataset. Body ignored.
pub const LIST_DATASETS: &str = "list_datasets";

/// Summary of one dataset. Body: UTF-8 key.
pub const DESCRIBE: &str = "describe";

/// Column name and Arrow type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// One dataset as reported by the catalog actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub key: String,
    pub columns: Vec<ColumnSummary>,
    pub rows: u64,
    /// `None` when never measured
    pub bytes: Option<u64>,
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        let columns = dataset
            .schema()
            .fields()
            .iter()
            .map(|f| ColumnSummary {
                name: f.name().clone(),
                data_type: f.data_type().to_string(),
                nullable: f.is_nullable(),
            })
            .collect();

        Self {
            key: dataset.key().to_string(),
            columns,
            rows: dataset.row_count(),
            bytes: dataset.byte_size(),
        }
    }
}

/// Actions advertised by ListActions
pub fn action_types() -> Vec<ActionType> {
    vec![
        ActionType {
            r#type: LIST_DATASETS.to_string(),
            description: "Summarize every dataset. Args: none".to_string(),
        },
        ActionType {
            r#type: DESCRIBE.to_string(),
            description: "Summarize one dataset. Args: dataset key (UTF-8)".to_string(),
        },
    ]
}

/// Execute a catalog action, returning its JSON result.
pub fn execute_action(action_type: &str, body: &[u8], registry: &DatasetRegistry) -> Result<Vec<u8>> {
    match action_type {
        LIST_DATASETS => {
            let summaries: Vec<DatasetSummary> =
                registry.iter().map(|d| DatasetSummary::from(d.as_ref())).collect();
            Ok(serde_json::to_vec(&summaries)?)
        }
        DESCRIBE => {
            let key = std::str::from_utf8(body)
                .map_err(|_| Error::MalformedRequest("Invalid UTF-8 in action body".to_string()))?;
            let dataset = registry.lookup(key)?;
            Ok(serde_json::to_vec(&DatasetSummary::from(dataset.as_ref()))?)
        }
        other => Err(Error::MalformedRequest(format!(
            "Unknown action: {}. Use: {}, {}",
            other, LIST_DATASETS, DESCRIBE
        ))),
    }
}
