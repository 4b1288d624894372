use crate::domain::receipt::{Receipt, ReceiptStatus};
use crate::repo::outcome::{decode_all, insert, string_field, BulkDeleteReport, CreateOutcome};
use crate::store::{DeleteOutcome, DocumentStore, Filter, PatchOp, PatchOutcome};
use serde_json::Value;
use std::sync::Arc;

const DEBTOR_FISCAL_CODE: &str = "eventData.debtorFiscalCode";
const PAYER_FISCAL_CODE: &str = "eventData.payerFiscalCode";

#[derive(Clone)]
pub struct ReceiptsRepo {
    pub store: Arc<dyn DocumentStore>,
    pub collection: String,
}

impl ReceiptsRepo {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, receipt: &Receipt) -> anyhow::Result<CreateOutcome<Receipt>> {
        insert(self.store.as_ref(), &self.collection, &receipt.id, &receipt.event_id, receipt).await
    }

    pub async fn get_by_event_id(&self, event_id: &str) -> anyhow::Result<Vec<Receipt>> {
        let docs = self.store.query(&self.collection, &Filter::eq("eventId", event_id)).await?;
        decode_all(docs)
    }

    /// Receipts where the token appears as debtor or payer.
    pub async fn get_by_fiscal_code(&self, token: &str) -> anyhow::Result<Vec<Receipt>> {
        let filter = Filter::any_eq(&[DEBTOR_FISCAL_CODE, PAYER_FISCAL_CODE], token);
        decode_all(self.store.query(&self.collection, &filter).await?)
    }

    pub async fn get_by_debtor_fiscal_code(&self, token: &str) -> anyhow::Result<Vec<Receipt>> {
        let docs = self
            .store
            .query(&self.collection, &Filter::eq(DEBTOR_FISCAL_CODE, token))
            .await?;
        decode_all(docs)
    }

    pub async fn patch_status(
        &self,
        id: &str,
        partition_key: &str,
        status: ReceiptStatus,
    ) -> anyhow::Result<PatchOutcome> {
        let ops = [PatchOp::replace("status", Value::String(status.to_string()))];
        Ok(self.store.patch(&self.collection, id, partition_key, &ops).await?)
    }

    pub async fn delete(&self, id: &str, partition_key: &str) -> anyhow::Result<DeleteOutcome> {
        Ok(self.store.delete(&self.collection, id, partition_key).await?)
    }

    /// Deletes every receipt generated for `event_id`, continuing past failures.
    /// Receipts are partitioned by event id, so `event_id` is the partition key.
    pub async fn delete_by_event_id(&self, event_id: &str) -> anyhow::Result<BulkDeleteReport> {
        let docs = self.store.query(&self.collection, &Filter::eq("eventId", event_id)).await?;
        let mut report = BulkDeleteReport::default();
        for id in string_field(&docs, "id") {
            let result = self.store.delete(&self.collection, &id, event_id).await;
            report.record(&self.collection, &id, result);
        }
        Ok(report)
    }
}
