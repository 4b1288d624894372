use crate::domain::cart::Cart;
use crate::repo::biz_events_repo::BizEventsRepo;
use crate::repo::outcome::{decode_all, insert, string_field, BulkDeleteReport, CreateOutcome};
use crate::store::{DeleteOutcome, DocumentStore, Filter};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct CartsRepo {
    pub store: Arc<dyn DocumentStore>,
    pub collection: String,
}

impl CartsRepo {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, cart: &Cart) -> anyhow::Result<CreateOutcome<Cart>> {
        insert(self.store.as_ref(), &self.collection, &cart.id, &cart.id, cart).await
    }

    pub async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Cart>> {
        let docs = self.store.query(&self.collection, &Filter::eq("id", id)).await?;
        Ok(decode_all(docs)?.into_iter().next())
    }

    pub async fn delete(&self, id: &str) -> anyhow::Result<DeleteOutcome> {
        Ok(self.store.delete(&self.collection, id, id).await?)
    }

    /// Deletes the cart and every biz-event it references. A cart that cannot be
    /// read is still deleted; its events are then left to the caller.
    pub async fn delete_with_payments(&self, id: &str, biz_events: &BizEventsRepo) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        match self.get_by_id(id).await {
            Ok(Some(cart)) => report.merge(biz_events.delete_many(&cart.cart_payment_id).await),
            Ok(None) => {}
            Err(e) => warn!(cart_id = id, error = %e, "could not read cart before delete"),
        }
        let result = self.store.delete(&self.collection, id, id).await;
        report.record(&self.collection, id, result);
        report
    }

    pub async fn delete_by_id_prefix(&self, prefix: &str) -> anyhow::Result<BulkDeleteReport> {
        let docs = self.store.query(&self.collection, &Filter::prefix("id", prefix)).await?;
        let mut report = BulkDeleteReport::default();
        for id in string_field(&docs, "id") {
            let result = self.store.delete(&self.collection, &id, &id).await;
            report.record(&self.collection, &id, result);
        }
        Ok(report)
    }
}
