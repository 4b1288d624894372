use crate::blob::BlobStore;
use crate::repo::biz_events_repo::BizEventsRepo;
use crate::repo::outcome::BulkDeleteReport;
use crate::repo::receipt_errors_repo::ReceiptErrorsRepo;
use crate::repo::receipts_repo::ReceiptsRepo;
use anyhow::Result;
use std::sync::Arc;

/// Purges every fixture a test run left behind for a tokenized fiscal code.
#[derive(Clone)]
pub struct CleanupService {
    pub receipts: ReceiptsRepo,
    pub receipt_errors: ReceiptErrorsRepo,
    pub biz_events: BizEventsRepo,
    pub blobs: Arc<dyn BlobStore>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub receipts_found: usize,
    pub receipts: BulkDeleteReport,
    pub receipt_errors: BulkDeleteReport,
    pub biz_events: BulkDeleteReport,
    pub blobs: BulkDeleteReport,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.receipts.is_clean()
            && self.receipt_errors.is_clean()
            && self.biz_events.is_clean()
            && self.blobs.is_clean()
    }
}

impl CleanupService {
    pub async fn purge_by_debtor_fiscal_code(&self, token: &str) -> Result<CleanupReport> {
        let found = self.receipts.get_by_debtor_fiscal_code(token).await?;
        tracing::info!("found {} receipts for the test fiscal code", found.len());

        let mut report = CleanupReport {
            receipts_found: found.len(),
            ..CleanupReport::default()
        };

        for receipt in &found {
            tracing::info!("cleaning documents linked to receipt {}", receipt.id);

            for name in receipt.pdf_names() {
                let result = self.blobs.delete_if_exists(name).await;
                if let Err(e) = &result {
                    tracing::error!("error deleting PDF {} of receipt {}: {}", name, receipt.id, e);
                }
                report.blobs.record("blob", name, result);
            }

            let result = self.receipts.delete(&receipt.id, &receipt.event_id).await;
            report.receipts.record(&self.receipts.collection, &receipt.id, result);

            match self.receipt_errors.delete_by_biz_event_id(&receipt.event_id).await {
                Ok(r) => report.receipt_errors.merge(r),
                Err(e) => {
                    tracing::error!("error deleting receipt errors of {}: {}", receipt.event_id, e);
                    report.receipt_errors.failed += 1;
                }
            }

            let result = self.biz_events.delete(&receipt.event_id).await;
            report.biz_events.record(&self.biz_events.collection, &receipt.event_id, result);

            tracing::info!("done {}", receipt.id);
        }

        Ok(report)
    }
}
