use crate::scenario::{str_field, ScenarioContext};
use crate::wait;
use anyhow::{bail, ensure, Context, Result};
use serde_json::Value;
use std::time::Duration;

impl ScenarioContext {
    pub fn then_status_is(&self, expected: u16) -> Result<()> {
        self.check_budget("check status")?;
        let resp = self.last_response()?;
        ensure!(
            resp.status == expected,
            "expected HTTP {expected}, got {} ({})",
            resp.status,
            resp.transport_error.as_deref().unwrap_or(resp.raw.as_str())
        );
        Ok(())
    }

    pub fn then_receipt_has_event_id(&self, event_id: &str) -> Result<()> {
        let actual = str_field(self.receipt.as_ref(), "eventId");
        ensure!(actual == Some(event_id), "receipt eventId is {actual:?}, expected {event_id}");
        Ok(())
    }

    pub fn then_receipt_has_not_status(&self, status: &str) -> Result<()> {
        let Some(actual) = str_field(self.receipt.as_ref(), "status") else {
            bail!("no receipt status to check");
        };
        ensure!(actual != status, "receipt still has status {status}");
        Ok(())
    }

    /// The last datastore read found exactly one receipt.
    pub fn then_datastore_returns_receipt(&mut self) -> Result<()> {
        ensure!(!self.receipts.is_empty(), "no receipt found in datastore");
        if let Some(first) = self.receipts.first() {
            self.tracked.event(&first.event_id);
        }
        ensure!(
            self.receipts.len() == 1,
            "expected one receipt, found {}",
            self.receipts.len()
        );
        Ok(())
    }

    pub fn then_receipt_error_has_biz_event_id(&self, biz_event_id: &str) -> Result<()> {
        let actual = str_field(self.receipt_error.as_ref(), "bizEventId");
        ensure!(
            actual == Some(biz_event_id),
            "receipt-error bizEventId is {actual:?}, expected {biz_event_id}"
        );
        Ok(())
    }

    /// `messagePayload` holds the decrypted biz-event as a JSON string.
    pub fn then_receipt_error_payload_has_event_id(&self, event_id: &str) -> Result<()> {
        let Some(payload) = str_field(self.receipt_error.as_ref(), "messagePayload") else {
            bail!("receipt-error has no messagePayload");
        };
        let event: Value = serde_json::from_str(payload).context("messagePayload is not a decrypted biz-event")?;
        let actual = event.get("id").and_then(Value::as_str);
        ensure!(actual == Some(event_id), "decrypted payload id is {actual:?}, expected {event_id}");
        Ok(())
    }

    pub fn then_receipt_error_has_not_status(&self, status: &str) -> Result<()> {
        let Some(actual) = str_field(self.receipt_error.as_ref(), "status") else {
            bail!("no receipt-error status to check");
        };
        ensure!(actual != status, "receipt-error still has status {status}");
        Ok(())
    }

    pub async fn then_receipt_error_recovered_from_datastore(&mut self, biz_event_id: &str) -> Result<()> {
        self.check_budget("read receipt-error from datastore")?;
        let h = self.harness.clone();
        let repo = &h.receipt_errors;
        let found = wait::poll_until(self.poll_window(None), h.settings.poll_interval, move || async move {
            let errors = repo.get_by_biz_event_id(biz_event_id).await?;
            Ok::<_, anyhow::Error>(errors.into_iter().next())
        })
        .await
        .with_context(|| format!("receipt-error {biz_event_id} not found in datastore"))?;
        self.receipt_error = Some(serde_json::to_value(found)?);
        Ok(())
    }

    pub async fn then_receipt_recovered_from_datastore(&mut self, event_id: &str) -> Result<()> {
        self.check_budget("read receipt from datastore")?;
        let h = self.harness.clone();
        let repo = &h.receipts;
        let found = wait::poll_until(self.poll_window(None), h.settings.poll_interval, move || async move {
            let receipts = repo.get_by_event_id(event_id).await?;
            Ok::<_, anyhow::Error>(receipts.into_iter().next())
        })
        .await
        .with_context(|| format!("receipt {event_id} not found in datastore"))?;
        self.receipt = Some(serde_json::to_value(found)?);
        Ok(())
    }

    /// Polls the datastore until the receipt of `event_id` leaves `status`.
    pub async fn then_receipt_eventually_not_status(
        &mut self,
        event_id: &str,
        status: &str,
        within_ms: Option<u64>,
    ) -> Result<()> {
        self.check_budget("wait for receipt status change")?;
        let h = self.harness.clone();
        let repo = &h.receipts;
        let window = self.poll_window(within_ms.map(Duration::from_millis));
        let found = wait::poll_until(window, h.settings.poll_interval, move || async move {
            let receipts = repo.get_by_event_id(event_id).await?;
            let Some(first) = receipts.into_iter().next() else {
                bail!("receipt {event_id} disappeared from datastore");
            };
            Ok::<_, anyhow::Error>((first.status.to_string() != status).then_some(first))
        })
        .await
        .with_context(|| format!("receipt {event_id} kept status {status}"))?;
        self.receipt = Some(serde_json::to_value(found)?);
        Ok(())
    }

    /// Every receipt of the list fixture eventually leaves `status`.
    pub async fn then_receipts_eventually_not_status(&mut self, status: &str) -> Result<()> {
        ensure!(!self.receipts.is_empty(), "no list of receipts in this scenario");
        let event_ids: Vec<String> = self.receipts.iter().map(|r| r.event_id.clone()).collect();
        for event_id in event_ids {
            self.then_receipt_eventually_not_status(&event_id, status, None).await?;
        }
        Ok(())
    }

    /// Keeps the debtor attachment name so teardown removes the generated PDF.
    pub fn then_receipt_has_attachment_metadata(&mut self) -> Result<()> {
        let name = self
            .receipt
            .as_ref()
            .and_then(|r| r.get("mdAttach"))
            .and_then(|md| md.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let Some(name) = name else {
            bail!("receipt has no attachment metadata");
        };
        self.tracked.blob(&name);
        self.pdf_file_name = Some(name);
        Ok(())
    }

    pub async fn then_pdf_present_on_blob_store(&self) -> Result<()> {
        self.check_budget("check pdf on blob store")?;
        let Some(name) = self.pdf_file_name.as_deref() else {
            bail!("no PDF name known in this scenario");
        };
        ensure!(self.harness.blobs.exists(name).await?, "PDF {name} not found on blob store");
        Ok(())
    }

    pub fn then_receipt_message_has_event_id(&self, event_id: &str) -> Result<()> {
        let actual = str_field(self.receipt_message.as_ref(), "eventId");
        ensure!(actual == Some(event_id), "receipt message eventId is {actual:?}, expected {event_id}");
        Ok(())
    }

    pub fn then_receipt_message_has_message_id(&self, message_id: &str) -> Result<()> {
        let actual = str_field(self.receipt_message.as_ref(), "messageId");
        ensure!(
            actual == Some(message_id),
            "receipt message messageId is {actual:?}, expected {message_id}"
        );
        Ok(())
    }

    pub fn then_cart_has_id(&self, cart_id: &str) -> Result<()> {
        let actual = str_field(self.cart.as_ref(), "id");
        ensure!(actual == Some(cart_id), "cart id is {actual:?}, expected {cart_id}");
        Ok(())
    }

    pub async fn then_cart_eventually_not_status(&mut self, cart_id: &str, status: &str) -> Result<()> {
        self.check_budget("wait for cart status change")?;
        let h = self.harness.clone();
        let repo = &h.carts;
        let found = wait::poll_until(self.poll_window(None), h.settings.poll_interval, move || async move {
            let Some(cart) = repo.get_by_id(cart_id).await? else {
                bail!("cart {cart_id} disappeared from datastore");
            };
            Ok::<_, anyhow::Error>((cart.status.to_string() != status).then_some(cart))
        })
        .await
        .with_context(|| format!("cart {cart_id} kept status {status}"))?;
        self.cart = Some(serde_json::to_value(found)?);
        Ok(())
    }
}
