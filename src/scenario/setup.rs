use crate::domain::biz_event::BizEventStatus;
use crate::domain::cart::CartStatus;
use crate::domain::receipt::ReceiptStatus;
use crate::domain::receipt_error::ReceiptErrorStatus;
use crate::fixtures;
use crate::scenario::ScenarioContext;
use crate::store::PatchOutcome;
use anyhow::{bail, ensure, Result};
use tracing::info;

impl ScenarioContext {
    pub async fn given_biz_event(
        &mut self,
        id: &str,
        status: &str,
        org_code: Option<&str>,
        iuv: Option<&str>,
    ) -> Result<()> {
        self.check_budget("given biz event")?;
        let status: BizEventStatus = status.parse()?;
        self.tracked.event(id);

        let h = self.harness.clone();
        h.biz_events.delete(id).await?;
        let created = h
            .biz_events
            .create(&fixtures::create_event(id, Some(status), org_code, iuv))
            .await?;
        ensure!(
            created.status_code == 201,
            "biz event {id} was not created: status {}",
            created.status_code
        );
        info!(event_id = id, %status, "biz event stored");
        Ok(())
    }

    /// Stores `count` biz-events with ids `start0 .. start{count-1}`.
    pub async fn given_biz_events(&mut self, count: usize, status: &str, start: &str) -> Result<()> {
        for id in fixtures::sequential_ids(start, count) {
            self.given_biz_event(&id, status, None, None).await?;
        }
        Ok(())
    }

    pub async fn given_receipt(&mut self, id: &str, status: &str) -> Result<()> {
        self.check_budget("given receipt")?;
        let status: ReceiptStatus = status.parse()?;
        self.tracked.event(id);

        let h = self.harness.clone();
        h.receipts.delete_by_event_id(id).await?;
        let created = h.receipts.create(&fixtures::create_receipt(id, Some(status))).await?;
        ensure!(
            created.status_code == 201,
            "receipt {id} was not created: status {}",
            created.status_code
        );
        info!(event_id = id, %status, "receipt stored");
        Ok(())
    }

    pub async fn given_receipts(&mut self, count: usize, status: &str, start: &str) -> Result<()> {
        self.check_budget("given receipts")?;
        let status: ReceiptStatus = status.parse()?;
        let h = self.harness.clone();

        self.receipts.clear();
        for id in fixtures::sequential_ids(start, count) {
            self.tracked.event(&id);
            h.receipts.delete_by_event_id(&id).await?;
            let created = h.receipts.create(&fixtures::create_receipt(&id, Some(status))).await?;
            ensure!(
                created.status_code == 201,
                "receipt {id} was not created: status {}",
                created.status_code
            );
            self.receipts.push(created.document);
        }
        info!(count, start, %status, "receipts stored");
        Ok(())
    }

    pub async fn given_receipt_error(&mut self, biz_event_id: &str, status: &str) -> Result<()> {
        self.check_budget("given receipt-error")?;
        let status: ReceiptErrorStatus = status.parse()?;
        self.tracked.event(biz_event_id);

        let h = self.harness.clone();
        h.receipt_errors.delete(biz_event_id).await?;
        let receipt_error = fixtures::create_receipt_error(biz_event_id, Some(status), &h.settings.environment);
        let created = h.receipt_errors.create(&receipt_error).await?;
        ensure!(
            created.status_code == 201,
            "receipt-error {biz_event_id} was not created: status {}",
            created.status_code
        );
        Ok(())
    }

    pub async fn given_receipt_message(&mut self, event_id: &str, message_id: &str) -> Result<()> {
        self.check_budget("given receipt message")?;
        self.tracked.message(message_id);

        let h = self.harness.clone();
        h.receipt_messages.delete(message_id).await?;
        let created = h
            .receipt_messages
            .create(&fixtures::create_receipt_message(event_id, message_id))
            .await?;
        ensure!(
            created.status_code == 201,
            "receipt message {message_id} was not created: status {}",
            created.status_code
        );
        Ok(())
    }

    /// Uploads an empty PDF named `file_name`, written to the work dir first.
    pub async fn given_receipt_pdf(&mut self, file_name: &str) -> Result<()> {
        self.check_budget("given receipt pdf")?;
        let h = self.harness.clone();
        let local = h.settings.work_dir.join(file_name);
        self.tracked.blob(file_name);
        self.tracked.local_file(local.clone());
        self.pdf_file_name = Some(file_name.to_string());

        h.blobs.delete_if_exists(file_name).await?;
        tokio::fs::write(&local, b"").await?;
        let status = h.blobs.upload_from_path(file_name, &local).await;
        ensure!(status != 500, "upload of {file_name} failed");
        info!(blob = file_name, status, "receipt pdf uploaded");
        Ok(())
    }

    /// Stores a cart plus `count` linked biz-events `{cart_id}_0 ..` sharing one transaction.
    pub async fn given_cart(&mut self, cart_id: &str, count: usize, status: &str) -> Result<()> {
        self.check_budget("given cart")?;
        let status: CartStatus = status.parse()?;
        let h = self.harness.clone();

        self.tracked.cart(cart_id);
        let pre = h.carts.delete_with_payments(cart_id, &h.biz_events).await;
        ensure!(pre.is_clean(), "could not clear previous cart {cart_id}");

        let transaction_id = fixtures::random_suffix(1_000_000_000, 9_999_999_999);
        let event_ids = fixtures::sequential_ids(&format!("{cart_id}_"), count);
        for id in &event_ids {
            self.tracked.event(id);
            h.biz_events.delete(id).await?;
            let event = fixtures::create_event_for_cart(id, transaction_id, count, None);
            let created = h.biz_events.create(&event).await?;
            ensure!(
                created.status_code == 201,
                "cart event {id} was not created: status {}",
                created.status_code
            );
        }

        let created = h
            .carts
            .create(&fixtures::create_cart(cart_id, &event_ids, Some(status)))
            .await?;
        ensure!(
            created.status_code == 201,
            "cart {cart_id} was not created: status {}",
            created.status_code
        );
        info!(cart_id, count, %status, "cart stored");
        Ok(())
    }

    /// Forces the receipt generated for `event_id` into `FAILED`.
    pub async fn given_receipt_failed(&mut self, event_id: &str) -> Result<()> {
        self.check_budget("given failed receipt")?;
        self.tracked.event(event_id);

        let h = self.harness.clone();
        let receipts = h.receipts.get_by_event_id(event_id).await?;
        let Some(receipt) = receipts.first() else {
            bail!("no receipt found for event {event_id}");
        };
        let outcome = h
            .receipts
            .patch_status(&receipt.id, &receipt.event_id, ReceiptStatus::Failed)
            .await?;
        ensure!(outcome == PatchOutcome::Patched, "receipt {} vanished before patch", receipt.id);
        Ok(())
    }
}
