use crate::domain::receipt_error::ReceiptError;
use crate::repo::outcome::{decode_all, insert, string_field, BulkDeleteReport, CreateOutcome};
use crate::store::{DeleteOutcome, DocumentStore, Filter};
use std::sync::Arc;

#[derive(Clone)]
pub struct ReceiptErrorsRepo {
    pub store: Arc<dyn DocumentStore>,
    pub collection: String,
}

impl ReceiptErrorsRepo {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, receipt_error: &ReceiptError) -> anyhow::Result<CreateOutcome<ReceiptError>> {
        let id = receipt_error.id.as_str();
        insert(self.store.as_ref(), &self.collection, id, id, receipt_error).await
    }

    pub async fn get_by_biz_event_id(&self, biz_event_id: &str) -> anyhow::Result<Vec<ReceiptError>> {
        let docs = self
            .store
            .query(&self.collection, &Filter::eq("bizEventId", biz_event_id))
            .await?;
        decode_all(docs)
    }

    pub async fn delete(&self, id: &str) -> anyhow::Result<DeleteOutcome> {
        Ok(self.store.delete(&self.collection, id, id).await?)
    }

    pub async fn delete_by_biz_event_id(&self, biz_event_id: &str) -> anyhow::Result<BulkDeleteReport> {
        let docs = self
            .store
            .query(&self.collection, &Filter::eq("bizEventId", biz_event_id))
            .await?;
        let mut report = BulkDeleteReport::default();
        for id in string_field(&docs, "id") {
            let result = self.store.delete(&self.collection, &id, &id).await;
            report.record(&self.collection, &id, result);
        }
        Ok(report)
    }
}
