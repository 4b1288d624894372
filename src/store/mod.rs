use serde_json::Value;

pub mod mock;
pub mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {id} already exists in {collection}")]
    Conflict { collection: String, id: String },
    #[error("document store backend error: {0}")]
    Backend(String),
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    Absent,
}

/// Path of a field inside a document, e.g. `["eventData", "debtorFiscalCode"]`.
pub type FieldPath = Vec<String>;

pub fn field(path: &str) -> FieldPath {
    path.split('.').map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub enum Filter {
    Eq(FieldPath, String),
    AnyEq(Vec<FieldPath>, String),
    Prefix(FieldPath, String),
}

impl Filter {
    pub fn eq(path: &str, value: &str) -> Self {
        Filter::Eq(field(path), value.to_string())
    }

    pub fn any_eq(paths: &[&str], value: &str) -> Self {
        Filter::AnyEq(paths.iter().map(|p| field(p)).collect(), value.to_string())
    }

    pub fn prefix(path: &str, prefix: &str) -> Self {
        Filter::Prefix(field(path), prefix.to_string())
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(path, value) => lookup_str(doc, path) == Some(value.as_str()),
            Filter::AnyEq(paths, value) => paths.iter().any(|p| lookup_str(doc, p) == Some(value.as_str())),
            Filter::Prefix(path, prefix) => lookup_str(doc, path).is_some_and(|v| v.starts_with(prefix.as_str())),
        }
    }
}

fn lookup_str<'a>(doc: &'a Value, path: &[String]) -> Option<&'a str> {
    path.iter().try_fold(doc, |cur, key| cur.get(key))?.as_str()
}

#[derive(Debug, Clone)]
pub enum PatchOp {
    Replace { path: FieldPath, value: Value },
    Remove { path: FieldPath },
}

impl PatchOp {
    pub fn replace(path: &str, value: Value) -> Self {
        PatchOp::Replace { path: field(path), value }
    }

    pub fn remove(path: &str) -> Self {
        PatchOp::Remove { path: field(path) }
    }

    pub fn apply(&self, doc: &mut Value) {
        match self {
            PatchOp::Replace { path, value } => {
                if let Some((last, parents)) = path.split_last() {
                    if let Some(Value::Object(map)) = parents.iter().try_fold(&mut *doc, |cur, key| cur.get_mut(key)) {
                        map.insert(last.clone(), value.clone());
                    }
                }
            }
            PatchOp::Remove { path } => {
                if let Some((last, parents)) = path.split_last() {
                    if let Some(Value::Object(map)) = parents.iter().try_fold(&mut *doc, |cur, key| cur.get_mut(key)) {
                        map.remove(last);
                    }
                }
            }
        }
    }
}

/// Logical document collections keyed by `(id, partition_key)`.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the status code of the insert (201); an existing key is a `Conflict`.
    async fn create(&self, collection: &str, id: &str, partition_key: &str, body: Value) -> Result<u16, StoreError>;

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    async fn delete(&self, collection: &str, id: &str, partition_key: &str) -> Result<DeleteOutcome, StoreError>;

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        partition_key: &str,
        ops: &[PatchOp],
    ) -> Result<PatchOutcome, StoreError>;
}
