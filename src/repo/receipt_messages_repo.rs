use crate::domain::receipt_message::ReceiptMessage;
use crate::repo::outcome::{decode_all, insert, string_field, BulkDeleteReport, CreateOutcome};
use crate::store::{DeleteOutcome, DocumentStore, Filter};
use std::sync::Arc;

/// IO messages are keyed and partitioned by message id.
#[derive(Clone)]
pub struct ReceiptMessagesRepo {
    pub store: Arc<dyn DocumentStore>,
    pub collection: String,
}

impl ReceiptMessagesRepo {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, message: &ReceiptMessage) -> anyhow::Result<CreateOutcome<ReceiptMessage>> {
        let id = message.message_id.as_str();
        insert(self.store.as_ref(), &self.collection, id, id, message).await
    }

    pub async fn get_by_message_id(&self, message_id: &str) -> anyhow::Result<Vec<ReceiptMessage>> {
        let docs = self
            .store
            .query(&self.collection, &Filter::eq("messageId", message_id))
            .await?;
        decode_all(docs)
    }

    pub async fn delete(&self, message_id: &str) -> anyhow::Result<DeleteOutcome> {
        Ok(self.store.delete(&self.collection, message_id, message_id).await?)
    }

    pub async fn delete_by_event_id(&self, event_id: &str) -> anyhow::Result<BulkDeleteReport> {
        let docs = self.store.query(&self.collection, &Filter::eq("eventId", event_id)).await?;
        let mut report = BulkDeleteReport::default();
        for id in string_field(&docs, "messageId") {
            let result = self.store.delete(&self.collection, &id, &id).await;
            report.record(&self.collection, &id, result);
        }
        Ok(report)
    }
}
