use crate::domain::receipt::Receipt;
use crate::helpdesk::HelpdeskClient;
use crate::repo::biz_events_repo::BizEventsRepo;
use crate::repo::receipts_repo::ReceiptsRepo;
use crate::store::PatchOutcome;
use crate::tokenizer::TokenizerClient;
use crate::wait;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Re-runs PDF generation for every receipt of a list of fiscal codes: the biz-event is
/// pushed back to `RETRY`, and once the pipeline has picked it up the helpdesk is asked to
/// regenerate the PDF.
#[derive(Clone)]
pub struct RegenerationService {
    pub tokenizer: TokenizerClient,
    pub receipts: ReceiptsRepo,
    pub biz_events: BizEventsRepo,
    pub helpdesk: HelpdeskClient,
    pub settle: Duration,
    pub concurrency: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRegeneration {
    pub fiscal_code: String,
    pub event_id: String,
    pub receipt_id: String,
    pub debtor_pdf: Option<String>,
    pub payer_pdf: Option<String>,
    pub patch: Option<PatchOutcome>,
    pub regenerate_status: Option<u16>,
    pub error: Option<String>,
}

impl ReceiptRegeneration {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.regenerate_status.map_or(true, |s| (200..300).contains(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFailure {
    pub fiscal_code: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegenerationReport {
    pub receipts: Vec<ReceiptRegeneration>,
    pub failures: Vec<CodeFailure>,
}

impl RegenerationReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.receipts.iter().any(|r| !r.succeeded())
    }
}

/// Keeps fiscal codes out of the logs.
pub fn mask(fiscal_code: &str) -> String {
    let visible: String = fiscal_code.chars().take(3).collect();
    format!("{visible}***")
}

impl RegenerationService {
    /// Processes the codes on at most `concurrency` tasks and waits for all of them.
    pub async fn run(self: Arc<Self>, fiscal_codes: Vec<String>) -> RegenerationReport {
        let permits = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for fiscal_code in fiscal_codes {
            let service = self.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => service.regenerate_for(&fiscal_code).await,
                    Err(e) => Err(e.into()),
                };
                (fiscal_code, outcome)
            });
        }

        let mut report = RegenerationReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(done))) => report.receipts.extend(done),
                Ok((fiscal_code, Err(e))) => {
                    tracing::error!("regeneration for {} failed: {}", mask(&fiscal_code), e);
                    report.failures.push(CodeFailure {
                        fiscal_code,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("regeneration task aborted: {}", e);
                    report.failures.push(CodeFailure {
                        fiscal_code: String::new(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    pub async fn regenerate_for(&self, fiscal_code: &str) -> Result<Vec<ReceiptRegeneration>> {
        let token = self.tokenizer.search_token(fiscal_code).await?;
        let receipts = self.receipts.get_by_fiscal_code(&token).await?;
        tracing::info!("{}: {} receipts to regenerate", mask(fiscal_code), receipts.len());

        let mut done = Vec::with_capacity(receipts.len());
        for receipt in &receipts {
            done.push(self.regenerate_receipt(fiscal_code, receipt).await);
        }
        Ok(done)
    }

    async fn regenerate_receipt(&self, fiscal_code: &str, receipt: &Receipt) -> ReceiptRegeneration {
        let event_id = receipt.event_id.as_str();
        let mut entry = ReceiptRegeneration {
            fiscal_code: fiscal_code.to_string(),
            event_id: event_id.to_string(),
            receipt_id: receipt.id.clone(),
            debtor_pdf: receipt.md_attach.as_ref().map(|md| md.name.clone()),
            payer_pdf: receipt.md_attach_payer.as_ref().map(|md| md.name.clone()),
            patch: None,
            regenerate_status: None,
            error: None,
        };
        tracing::info!(
            "{} {} PDFd > {}, PDFp > {}",
            mask(fiscal_code),
            event_id,
            entry.debtor_pdf.as_deref().unwrap_or("NA"),
            entry.payer_pdf.as_deref().unwrap_or("NA")
        );

        match self.biz_events.get_document_by_id(event_id).await {
            Ok(Some(event)) => tracing::debug!("biz event {}: {}", event_id, event),
            Ok(None) => tracing::warn!("biz event {} not found", event_id),
            Err(e) => tracing::warn!("cannot read biz event {}: {}", event_id, e),
        }

        if self.dry_run {
            return entry;
        }

        match self.biz_events.patch_status_to_retry(event_id).await {
            Ok(outcome) => entry.patch = Some(outcome),
            Err(e) => {
                tracing::error!("cannot move biz event {} to RETRY: {}", event_id, e);
                entry.error = Some(e.to_string());
                return entry;
            }
        }

        wait::settle(self.settle.as_millis() as u64).await;
        let resp = self.helpdesk.post_regenerate_receipt_pdf(event_id).await;
        tracing::info!("regenerate pdf {} = {}", event_id, resp.status);
        entry.regenerate_status = Some(resp.status);
        if let Some(e) = resp.transport_error {
            entry.error = Some(e);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_hides_all_but_prefix() {
        assert_eq!(mask("AAAAAA00A00A000A"), "AAA***");
        assert_eq!(mask("ab"), "ab***");
    }
}
