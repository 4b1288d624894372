use anyhow::Result;
use clap::Parser;
use receipt_helpdesk_harness::blob::s3::S3BlobStore;
use receipt_helpdesk_harness::config::AppConfig;
use receipt_helpdesk_harness::fixtures::TOKENIZED_FISCAL_CODE;
use receipt_helpdesk_harness::repo::biz_events_repo::BizEventsRepo;
use receipt_helpdesk_harness::repo::receipt_errors_repo::ReceiptErrorsRepo;
use receipt_helpdesk_harness::repo::receipts_repo::ReceiptsRepo;
use receipt_helpdesk_harness::service::cleanup::CleanupService;
use receipt_helpdesk_harness::store::postgres::PgDocumentStore;
use receipt_helpdesk_harness::store::DocumentStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Removes receipts, receipt-errors, biz-events and PDFs left behind by test runs.
#[derive(Debug, Parser)]
#[command(name = "teardown")]
struct Args {
    /// Tokenized debtor fiscal code whose receipts are purged.
    #[arg(long, env = "TEARDOWN_FISCAL_CODE_TOKEN", default_value = TOKENIZED_FISCAL_CODE)]
    fiscal_code_token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = AppConfig::from_env()?;

    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::connect(cfg.require_database_url()?, 5).await?);
    let blobs = Arc::new(S3BlobStore::from_config(&cfg.blob).await);

    let cleanup = CleanupService {
        receipts: ReceiptsRepo::new(store.clone(), cfg.collections.receipts.clone()),
        receipt_errors: ReceiptErrorsRepo::new(store.clone(), cfg.collections.receipt_errors.clone()),
        biz_events: BizEventsRepo::new(store, cfg.collections.biz_events.clone()),
        blobs,
    };

    let report = cleanup.purge_by_debtor_fiscal_code(&args.fiscal_code_token).await?;
    tracing::info!(
        "teardown done: {} receipts found, {} deleted, {} pdfs deleted, {} failures",
        report.receipts_found,
        report.receipts.deleted,
        report.blobs.deleted,
        report.receipts.failed + report.receipt_errors.failed + report.biz_events.failed + report.blobs.failed
    );
    if !report.is_clean() {
        anyhow::bail!("teardown finished with failures");
    }
    Ok(())
}
