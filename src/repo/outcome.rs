use crate::store::{DeleteOutcome, DocumentStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// Result of inserting a fixture: the status code is what scenarios assert against.
#[derive(Debug, Clone)]
pub struct CreateOutcome<T> {
    pub status_code: u16,
    pub document: T,
}

impl<T> CreateOutcome<T> {
    pub fn is_created(&self) -> bool {
        self.status_code == 201
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: usize,
    pub absent: usize,
    pub failed: usize,
}

impl BulkDeleteReport {
    pub fn record<E: std::fmt::Display>(&mut self, collection: &str, id: &str, result: Result<DeleteOutcome, E>) {
        match result {
            Ok(DeleteOutcome::Deleted) => self.deleted += 1,
            Ok(DeleteOutcome::Absent) => self.absent += 1,
            Err(e) => {
                warn!(collection, id, error = %e, "document delete failed");
                self.failed += 1;
            }
        }
    }

    pub fn merge(&mut self, other: BulkDeleteReport) {
        self.deleted += other.deleted;
        self.absent += other.absent;
        self.failed += other.failed;
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub(crate) async fn insert<T>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    partition_key: &str,
    document: &T,
) -> anyhow::Result<CreateOutcome<T>>
where
    T: Serialize + Clone,
{
    let body = serde_json::to_value(document)?;
    let status_code = match store.create(collection, id, partition_key, body).await {
        Ok(code) => code,
        Err(StoreError::Conflict { .. }) => {
            warn!(collection, id, "document already exists");
            409
        }
        Err(e) => {
            error!(collection, id, error = %e, "document create failed");
            return Err(e.into());
        }
    };
    Ok(CreateOutcome {
        status_code,
        document: document.clone(),
    })
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> anyhow::Result<Vec<T>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(anyhow::Error::from))
        .collect()
}

/// Reads `field` of each document as a string, skipping documents without it.
pub(crate) fn string_field(docs: &[Value], field: &str) -> Vec<String> {
    docs.iter()
        .filter_map(|doc| doc.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
