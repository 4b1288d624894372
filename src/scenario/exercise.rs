use crate::helpdesk::ApiResponse;
use crate::scenario::ScenarioContext;
use crate::wait;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

impl ScenarioContext {
    fn record(&mut self, resp: ApiResponse) -> Option<Value> {
        let body = (!resp.body.is_null()).then(|| resp.body.clone());
        self.last_response = Some(resp);
        body
    }

    pub async fn when_get_receipt(&mut self, event_id: &str) -> Result<()> {
        self.check_budget("get receipt")?;
        let resp = self.harness.helpdesk.get_receipt(event_id).await;
        self.receipt = self.record(resp);
        Ok(())
    }

    pub async fn when_get_receipt_by_org_and_iuv(&mut self, org_fiscal_code: &str, iuv: &str) -> Result<()> {
        self.check_budget("get receipt by organization and iuv")?;
        let resp = self.harness.helpdesk.get_receipt_by_org_and_iuv(org_fiscal_code, iuv).await;
        self.receipt = self.record(resp);
        Ok(())
    }

    pub async fn when_get_receipt_error(&mut self, biz_event_id: &str) -> Result<()> {
        self.check_budget("get receipt-error")?;
        let resp = self.harness.helpdesk.get_receipt_error(biz_event_id).await;
        self.receipt_error = self.record(resp);
        Ok(())
    }

    pub async fn when_get_receipt_message(&mut self, message_id: &str) -> Result<()> {
        self.check_budget("get receipt message")?;
        let resp = self.harness.helpdesk.get_receipt_message(message_id).await;
        self.receipt_message = self.record(resp);
        Ok(())
    }

    pub async fn when_get_receipt_pdf(&mut self, file_name: &str) -> Result<()> {
        self.check_budget("get receipt pdf")?;
        let resp = self.harness.helpdesk.get_receipt_pdf(file_name).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_get_cart(&mut self, cart_id: &str) -> Result<()> {
        self.check_budget("get cart")?;
        let resp = self.harness.helpdesk.get_cart(cart_id).await;
        self.cart = self.record(resp);
        Ok(())
    }

    pub async fn when_receipt_to_reviewed(&mut self, event_id: &str) -> Result<()> {
        self.check_budget("receipt to reviewed")?;
        let resp = self.harness.helpdesk.post_receipt_to_reviewed(event_id).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_failed(&mut self, event_id: Option<&str>) -> Result<()> {
        self.check_budget("recover failed receipt")?;
        let resp = self.harness.helpdesk.post_recover_failed(event_id).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_failed_massive(&mut self, status: &str) -> Result<()> {
        self.check_budget("recover failed receipts")?;
        let resp = self.harness.helpdesk.post_recover_failed_massive(status).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_not_notified(&mut self, event_id: Option<&str>) -> Result<()> {
        self.check_budget("recover not notified receipt")?;
        let resp = self.harness.helpdesk.post_recover_not_notified(event_id).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_not_notified_massive(&mut self, status: &str) -> Result<()> {
        self.check_budget("recover not notified receipts")?;
        let resp = self.harness.helpdesk.post_recover_not_notified_massive(status).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_regenerate_receipt_pdf(&mut self, biz_event_id: &str) -> Result<()> {
        self.check_budget("regenerate receipt pdf")?;
        let resp = self.harness.helpdesk.post_regenerate_receipt_pdf(biz_event_id).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_failed_cart(&mut self, cart_id: Option<&str>) -> Result<()> {
        self.check_budget("recover failed cart")?;
        let resp = self.harness.helpdesk.post_recover_failed_cart(cart_id).await;
        self.record(resp);
        Ok(())
    }

    pub async fn when_recover_failed_cart_massive(&mut self, status: &str) -> Result<()> {
        self.check_budget("recover failed carts")?;
        let resp = self.harness.helpdesk.post_recover_failed_cart_massive(status).await;
        self.record(resp);
        Ok(())
    }

    pub async fn wait(&mut self, ms: u64) -> Result<()> {
        self.check_budget("wait")?;
        let ms = ms.min(self.remaining().as_millis() as u64);
        wait::settle(ms).await;
        Ok(())
    }

    /// Reads the receipts of `event_id`, polling up to `within_ms` for the background
    /// generation to produce one. An empty result is left for the verification to judge.
    pub async fn when_receipts_read_from_datastore(&mut self, event_id: &str, within_ms: u64) -> Result<()> {
        self.check_budget("read receipts from datastore")?;
        let h = self.harness.clone();
        let window = self.poll_window(Some(Duration::from_millis(within_ms)));

        let repo = &h.receipts;
        let found = wait::poll_until(window, h.settings.poll_interval, move || async move {
            let receipts = repo.get_by_event_id(event_id).await?;
            Ok::<_, anyhow::Error>((!receipts.is_empty()).then_some(receipts))
        })
        .await;

        self.receipts = match found {
            Ok(receipts) => receipts,
            Err(e) => {
                debug!(event_id, error = %e, "no receipt generated within the window");
                h.receipts.get_by_event_id(event_id).await?
            }
        };
        self.receipt = match self.receipts.first() {
            Some(receipt) => Some(serde_json::to_value(receipt)?),
            None => None,
        };
        Ok(())
    }
}
