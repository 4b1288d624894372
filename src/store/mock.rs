use crate::store::{DeleteOutcome, DocumentStore, Filter, PatchOp, PatchOutcome, StoreError};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

type Key = (String, String, String);

/// In-memory document store with the same semantics as the Postgres backend.
#[derive(Clone, Default)]
pub struct MockDocumentStore {
    docs: Arc<RwLock<BTreeMap<Key, (u64, Value)>>>,
    failing_deletes: Arc<RwLock<HashSet<String>>>,
    seq: Arc<std::sync::atomic::AtomicU64>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delete of `id` fail with a backend error.
    pub async fn fail_deletes_of(&self, id: &str) {
        self.failing_deletes.write().await.insert(id.to_string());
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.docs
            .read()
            .await
            .keys()
            .filter(|(c, _, _)| c == collection)
            .count()
    }

    pub async fn total(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn get(&self, collection: &str, id: &str, partition_key: &str) -> Option<Value> {
        self.docs
            .read()
            .await
            .get(&key(collection, id, partition_key))
            .map(|(_, doc)| doc.clone())
    }

    /// Overwrites or inserts a document, standing in for writes done by the system under test.
    pub async fn put(&self, collection: &str, id: &str, partition_key: &str, body: Value) {
        let seq = self.seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.docs
            .write()
            .await
            .insert(key(collection, id, partition_key), (seq, body));
    }
}

fn key(collection: &str, id: &str, partition_key: &str) -> Key {
    (collection.to_string(), id.to_string(), partition_key.to_string())
}

#[async_trait::async_trait]
impl DocumentStore for MockDocumentStore {
    async fn create(&self, collection: &str, id: &str, partition_key: &str, body: Value) -> Result<u16, StoreError> {
        let mut docs = self.docs.write().await;
        let k = key(collection, id, partition_key);
        if docs.contains_key(&k) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let seq = self.seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        docs.insert(k, (seq, body));
        Ok(201)
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let docs = self.docs.read().await;
        let mut found: Vec<(u64, Value)> = docs
            .iter()
            .filter(|((c, _, _), (_, doc))| c == collection && filter.matches(doc))
            .map(|(_, (seq, doc))| (*seq, doc.clone()))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn delete(&self, collection: &str, id: &str, partition_key: &str) -> Result<DeleteOutcome, StoreError> {
        if self.failing_deletes.read().await.contains(id) {
            return Err(StoreError::Backend(format!("injected delete failure for {id}")));
        }
        Ok(match self.docs.write().await.remove(&key(collection, id, partition_key)) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::Absent,
        })
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        partition_key: &str,
        ops: &[PatchOp],
    ) -> Result<PatchOutcome, StoreError> {
        let mut docs = self.docs.write().await;
        let Some((_, doc)) = docs.get_mut(&key(collection, id, partition_key)) else {
            return Ok(PatchOutcome::Absent);
        };
        for op in ops {
            op.apply(doc);
        }
        Ok(PatchOutcome::Patched)
    }
}
