use crate::repo::outcome::BulkDeleteReport;
use crate::scenario::{ScenarioContext, Tracked};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub documents: BulkDeleteReport,
    pub blobs: BulkDeleteReport,
    pub files_removed: usize,
    pub file_failures: usize,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.documents.is_clean() && self.blobs.is_clean() && self.file_failures == 0
    }
}

impl ScenarioContext {
    /// Removes everything the scenario created, one delete at a time. Never fails:
    /// problems are logged and counted in the report. The context is reset afterwards.
    pub async fn teardown(&mut self) -> TeardownReport {
        let tracked = std::mem::take(&mut self.tracked);
        let h = self.harness.clone();
        let mut report = TeardownReport::default();

        for cart_id in &tracked.cart_ids {
            report
                .documents
                .merge(h.carts.delete_with_payments(cart_id, &h.biz_events).await);
        }
        for event_id in &tracked.receipt_event_ids {
            match h.receipts.delete_by_event_id(event_id).await {
                Ok(r) => report.documents.merge(r),
                Err(e) => {
                    warn!(event_id = %event_id, error = %e, "could not look up receipts to delete");
                    report.documents.failed += 1;
                }
            }
        }
        for biz_event_id in &tracked.receipt_error_ids {
            match h.receipt_errors.delete_by_biz_event_id(biz_event_id).await {
                Ok(r) => report.documents.merge(r),
                Err(e) => {
                    warn!(biz_event_id = %biz_event_id, error = %e, "could not look up receipt-errors to delete");
                    report.documents.failed += 1;
                }
            }
        }
        for message_id in &tracked.message_ids {
            let result = h.receipt_messages.delete(message_id).await;
            report.documents.record(&h.receipt_messages.collection, message_id, result);
        }
        report
            .documents
            .merge(h.biz_events.delete_many(&tracked.biz_event_ids).await);

        for name in &tracked.blob_names {
            let result = h.blobs.delete_if_exists(name).await;
            report.blobs.record("blob", name, result);
        }
        remove_local_files(&tracked, &mut report).await;

        self.reset();
        info!(
            deleted = report.documents.deleted,
            absent = report.documents.absent,
            failed = report.documents.failed,
            blobs = report.blobs.deleted,
            "scenario teardown done"
        );
        report
    }

    fn reset(&mut self) {
        self.tracked = Tracked::default();
        self.last_response = None;
        self.receipt = None;
        self.receipt_error = None;
        self.receipt_message = None;
        self.cart = None;
        self.receipts.clear();
        self.pdf_file_name = None;
    }
}

async fn remove_local_files(tracked: &Tracked, report: &mut TeardownReport) {
    for path in &tracked.local_files {
        match tokio::fs::remove_file(path).await {
            Ok(()) => report.files_removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not remove local fixture file");
                report.file_failures += 1;
            }
        }
    }
}
