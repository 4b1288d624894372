use crate::domain::biz_event::{BizEvent, BizEventStatus};
use crate::repo::outcome::{decode_all, insert, BulkDeleteReport, CreateOutcome};
use crate::store::{DeleteOutcome, DocumentStore, Filter, PatchOp, PatchOutcome};
use serde_json::Value;
use std::sync::Arc;

/// Biz-events are partitioned by their own id.
#[derive(Clone)]
pub struct BizEventsRepo {
    pub store: Arc<dyn DocumentStore>,
    pub collection: String,
}

impl BizEventsRepo {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, event: &BizEvent) -> anyhow::Result<CreateOutcome<BizEvent>> {
        insert(self.store.as_ref(), &self.collection, &event.id, &event.id, event).await
    }

    pub async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<BizEvent>> {
        let docs = self.store.query(&self.collection, &Filter::eq("id", id)).await?;
        Ok(decode_all(docs)?.into_iter().next())
    }

    /// Untyped read, for events written by other systems that may not fit [`BizEvent`].
    pub async fn get_document_by_id(&self, id: &str) -> anyhow::Result<Option<Value>> {
        let docs = self.store.query(&self.collection, &Filter::eq("id", id)).await?;
        Ok(docs.into_iter().next())
    }

    pub async fn delete(&self, id: &str) -> anyhow::Result<DeleteOutcome> {
        Ok(self.store.delete(&self.collection, id, id).await?)
    }

    /// Puts the event back in the enrichment pipeline: `RETRY` and no transaction details.
    pub async fn patch_status_to_retry(&self, id: &str) -> anyhow::Result<PatchOutcome> {
        let ops = [
            PatchOp::replace("eventStatus", Value::String(BizEventStatus::Retry.to_string())),
            PatchOp::remove("transactionDetails"),
        ];
        Ok(self.store.patch(&self.collection, id, id, &ops).await?)
    }

    pub async fn delete_many(&self, ids: &[String]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for id in ids {
            let result = self.store.delete(&self.collection, id, id).await;
            report.record(&self.collection, id, result);
        }
        report
    }
}
