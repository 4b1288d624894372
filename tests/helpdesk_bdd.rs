//! Acceptance scenarios run against a deployed helpdesk and its datastores.

use anyhow::Result;
use cucumber::{given, then, when, World};
use receipt_helpdesk_harness::blob::s3::S3BlobStore;
use receipt_helpdesk_harness::config::AppConfig;
use receipt_helpdesk_harness::helpdesk::HelpdeskClient;
use receipt_helpdesk_harness::scenario::{Harness, ScenarioContext};
use receipt_helpdesk_harness::store::postgres::PgDocumentStore;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;

static HARNESS: OnceLock<Arc<Harness>> = OnceLock::new();

#[derive(World)]
#[world(init = Self::new)]
struct HelpdeskWorld {
    ctx: ScenarioContext,
}

impl HelpdeskWorld {
    fn new() -> Self {
        let harness = HARNESS.get().expect("harness is built before scenarios run").clone();
        Self {
            ctx: ScenarioContext::new(harness),
        }
    }
}

impl fmt::Debug for HelpdeskWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpdeskWorld")
            .field("tracked", &self.ctx.tracked)
            .field("last_status", &self.ctx.last_response.as_ref().map(|r| r.status))
            .finish()
    }
}

// Given

#[given(expr = "a biz event with id {string} and status {string} stored on biz-events datastore")]
async fn biz_event(w: &mut HelpdeskWorld, id: String, status: String) -> Result<()> {
    w.ctx.given_biz_event(&id, &status, None, None).await
}

#[given(
    expr = "a biz event with id {string} and status {string} and organizationFiscalCode {string} and IUV {string} stored on biz-events datastore"
)]
async fn biz_event_with_iuv(w: &mut HelpdeskWorld, id: String, status: String, org: String, iuv: String) -> Result<()> {
    w.ctx.given_biz_event(&id, &status, Some(&org), Some(&iuv)).await
}

#[given(expr = "a random biz event with id {string} stored on biz-events datastore with status DONE")]
async fn random_biz_event(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.given_biz_event(&id, "DONE", None, None).await
}

#[given(expr = "a list of {int} biz events in status {string} stored into biz-events datastore starting from eventId {string}")]
async fn biz_events(w: &mut HelpdeskWorld, count: usize, status: String, start: String) -> Result<()> {
    w.ctx.given_biz_events(count, &status, &start).await
}

#[given(expr = "a receipt with eventId {string} and status {string} stored into receipt datastore")]
async fn receipt(w: &mut HelpdeskWorld, id: String, status: String) -> Result<()> {
    w.ctx.given_receipt(&id, &status).await
}

#[given(expr = "a list of {int} receipts in status {string} stored into receipt datastore starting from eventId {string}")]
async fn receipts(w: &mut HelpdeskWorld, count: usize, status: String, start: String) -> Result<()> {
    w.ctx.given_receipts(count, &status, &start).await
}

#[given(expr = "a random receipt with id {string} stored with status FAILED")]
async fn failed_receipt(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.given_receipt_failed(&id).await
}

#[given(expr = "a receipt-error with bizEventId {string} and status {string} stored into receipt-error datastore")]
async fn receipt_error(w: &mut HelpdeskWorld, id: String, status: String) -> Result<()> {
    w.ctx.given_receipt_error(&id, &status).await
}

#[given(expr = "a receipt-io-message with bizEventId {string} and messageId {string} stored into receipt-message datastore")]
async fn receipt_message(w: &mut HelpdeskWorld, event_id: String, message_id: String) -> Result<()> {
    w.ctx.given_receipt_message(&event_id, &message_id).await
}

#[given(expr = "a receipt pdf with filename {string} stored into blob storage")]
async fn receipt_pdf(w: &mut HelpdeskWorld, file_name: String) -> Result<()> {
    w.ctx.given_receipt_pdf(&file_name).await
}

#[given(expr = "a cart with id {string} and {int} payments in status {string} stored into cart datastore")]
async fn cart(w: &mut HelpdeskWorld, cart_id: String, count: usize, status: String) -> Result<()> {
    w.ctx.given_cart(&cart_id, count, &status).await
}

// When

#[when(expr = "getReceipt API is called with eventId {string}")]
async fn get_receipt(w: &mut HelpdeskWorld, event_id: String) -> Result<()> {
    w.ctx.when_get_receipt(&event_id).await
}

#[when(expr = "getReceiptByOrganizationFiscalCodeAndIUV API is called with organizationFiscalCode {string} and IUV {string}")]
async fn get_receipt_by_iuv(w: &mut HelpdeskWorld, org: String, iuv: String) -> Result<()> {
    w.ctx.when_get_receipt_by_org_and_iuv(&org, &iuv).await
}

#[when(expr = "getReceiptError API is called with bizEventId {string}")]
async fn get_receipt_error(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_get_receipt_error(&id).await
}

#[when(expr = "getReceiptMessage API is called with messageId {string}")]
async fn get_receipt_message(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_get_receipt_message(&id).await
}

#[when(expr = "getReceiptPdf API is called with filename {string}")]
async fn get_receipt_pdf(w: &mut HelpdeskWorld, file_name: String) -> Result<()> {
    w.ctx.when_get_receipt_pdf(&file_name).await
}

#[when(expr = "getCart API is called with cartId {string}")]
async fn get_cart(w: &mut HelpdeskWorld, cart_id: String) -> Result<()> {
    w.ctx.when_get_cart(&cart_id).await
}

#[when(expr = "receiptToReviewed API is called with bizEventId {string}")]
async fn to_reviewed(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_receipt_to_reviewed(&id).await
}

#[when(expr = "recoverFailedReceipt API is called with eventId {string}")]
async fn recover_failed(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_recover_failed(Some(&id)).await
}

#[when("recoverFailedReceipt API is called without eventId")]
async fn recover_failed_without_id(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.when_recover_failed(None).await
}

#[when(expr = "recoverFailedReceiptMassive API is called with status {string} as query param")]
async fn recover_failed_massive(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.when_recover_failed_massive(&status).await
}

#[when(expr = "recoverNotNotifiedReceipt API is called with eventId {string}")]
async fn recover_not_notified(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_recover_not_notified(Some(&id)).await
}

#[when("recoverNotNotifiedReceipt API is called without eventId")]
async fn recover_not_notified_without_id(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.when_recover_not_notified(None).await
}

#[when(expr = "recoverNotNotifiedReceiptMassive API is called with status {string} as query param")]
async fn recover_not_notified_massive(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.when_recover_not_notified_massive(&status).await
}

#[when(expr = "regenerateReceiptPdf API is called with bizEventId {string} as query param")]
async fn regenerate_pdf(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.when_regenerate_receipt_pdf(&id).await
}

#[when(expr = "recoverFailedCart API is called with cartId {string}")]
async fn recover_failed_cart(w: &mut HelpdeskWorld, cart_id: String) -> Result<()> {
    w.ctx.when_recover_failed_cart(Some(&cart_id)).await
}

#[when("recoverFailedCart API is called without cartId")]
async fn recover_failed_cart_without_id(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.when_recover_failed_cart(None).await
}

#[when(expr = "recoverFailedCartMassive API is called with status {string} as query param")]
async fn recover_failed_cart_massive(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.when_recover_failed_cart_massive(&status).await
}

#[when(expr = "biz event has been properly stored into receipt datastore after {int} ms with eventId {string}")]
async fn receipts_from_datastore(w: &mut HelpdeskWorld, ms: u64, event_id: String) -> Result<()> {
    w.ctx.when_receipts_read_from_datastore(&event_id, ms).await
}

// Then

#[then(expr = "wait {int} ms")]
async fn wait(w: &mut HelpdeskWorld, ms: u64) -> Result<()> {
    w.ctx.wait(ms).await
}

#[then(regex = r"^(?:the api )?response has a (\d+) Http status$")]
async fn status(w: &mut HelpdeskWorld, code: u16) -> Result<()> {
    w.ctx.then_status_is(code)
}

#[then(expr = "the receipt has eventId {string}")]
async fn receipt_event_id(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_has_event_id(&id)
}

#[then(expr = "the receipt has not status {string}")]
async fn receipt_not_status(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.then_receipt_has_not_status(&status)
}

#[then(expr = "the receipt with eventId {string} has not the status {string} after {int} ms")]
async fn receipt_not_status_after(w: &mut HelpdeskWorld, id: String, status: String, ms: u64) -> Result<()> {
    w.ctx.then_receipt_eventually_not_status(&id, &status, Some(ms)).await
}

#[then(expr = "the receipt with eventId {string} is recovered from datastore")]
async fn receipt_recovered(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_recovered_from_datastore(&id).await
}

#[then(expr = "the list of receipt is recovered from datastore and no receipt in the list has status {string}")]
async fn receipts_not_status(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.then_receipts_eventually_not_status(&status).await
}

#[then("the receipts datastore returns the receipt")]
async fn datastore_returns_receipt(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.then_datastore_returns_receipt()
}

#[then("the receipt has attachment metadata")]
async fn attachment_metadata(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.then_receipt_has_attachment_metadata()
}

#[then("the PDF is present on blob storage")]
async fn pdf_present(w: &mut HelpdeskWorld) -> Result<()> {
    w.ctx.then_pdf_present_on_blob_store().await
}

#[then(expr = "the receipt-error has bizEventId {string}")]
async fn receipt_error_id(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_error_has_biz_event_id(&id)
}

#[then(expr = "the receipt-error payload has bizEvent decrypted with eventId {string}")]
async fn receipt_error_payload(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_error_payload_has_event_id(&id)
}

#[then(expr = "the receipt-error has not status {string}")]
async fn receipt_error_not_status(w: &mut HelpdeskWorld, status: String) -> Result<()> {
    w.ctx.then_receipt_error_has_not_status(&status)
}

#[then(expr = "the receipt-error with bizEventId {string} is recovered from datastore")]
async fn receipt_error_recovered(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_error_recovered_from_datastore(&id).await
}

#[then(expr = "the receipt-message has eventId {string}")]
async fn message_event_id(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_message_has_event_id(&id)
}

#[then(expr = "the receipt-message has messageId {string}")]
async fn message_id(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_receipt_message_has_message_id(&id)
}

#[then(expr = "the cart has id {string}")]
async fn cart_id(w: &mut HelpdeskWorld, id: String) -> Result<()> {
    w.ctx.then_cart_has_id(&id)
}

#[then(expr = "the cart with id {string} has not status {string}")]
async fn cart_not_status(w: &mut HelpdeskWorld, id: String, status: String) -> Result<()> {
    w.ctx.then_cart_eventually_not_status(&id, &status).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;
    let store = PgDocumentStore::connect(cfg.require_database_url()?, 5).await?;
    let blobs = S3BlobStore::from_config(&cfg.blob).await;
    let helpdesk = HelpdeskClient::from_config(&cfg)?;
    let _ = HARNESS.set(Arc::new(Harness::new(&cfg, Arc::new(store), Arc::new(blobs), helpdesk)));

    HelpdeskWorld::cucumber()
        .after(|_feature, _rule, _scenario, _finished, world| {
            Box::pin(async move {
                if let Some(world) = world {
                    let report = world.ctx.teardown().await;
                    if !report.is_clean() {
                        tracing::warn!("teardown left documents behind: {:?}", report);
                    }
                }
            })
        })
        .run_and_exit("tests/features")
        .await;
    Ok(())
}
