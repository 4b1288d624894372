use anyhow::{bail, Context, Result};
use clap::Parser;
use receipt_helpdesk_harness::config::AppConfig;
use receipt_helpdesk_harness::helpdesk::HelpdeskClient;
use receipt_helpdesk_harness::repo::biz_events_repo::BizEventsRepo;
use receipt_helpdesk_harness::repo::receipts_repo::ReceiptsRepo;
use receipt_helpdesk_harness::service::regeneration::RegenerationService;
use receipt_helpdesk_harness::store::postgres::PgDocumentStore;
use receipt_helpdesk_harness::store::DocumentStore;
use receipt_helpdesk_harness::tokenizer::TokenizerClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Regenerates the receipt PDFs of a list of citizens.
#[derive(Debug, Parser)]
#[command(name = "regenerate_pdfs")]
struct Args {
    /// File with one fiscal code per line; blank lines and `#` comments are skipped.
    #[arg(long)]
    fiscal_codes_file: Option<PathBuf>,

    #[arg(long = "fiscal-code")]
    fiscal_codes: Vec<String>,

    /// Only list the receipts that would be regenerated.
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    concurrency: Option<usize>,
}

fn parse_fiscal_codes(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = AppConfig::from_env()?;

    let mut fiscal_codes = args.fiscal_codes.clone();
    if let Some(path) = &args.fiscal_codes_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        fiscal_codes.extend(parse_fiscal_codes(&raw));
    }
    if fiscal_codes.is_empty() {
        bail!("no fiscal codes given: use --fiscal-code or --fiscal-codes-file");
    }

    let Some(tokenizer_url) = cfg.tokenizer_url.as_deref() else {
        bail!("TOKENIZER_URL must be set");
    };
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::connect(cfg.require_database_url()?, 10).await?);

    let service = Arc::new(RegenerationService {
        tokenizer: TokenizerClient::new(tokenizer_url, &cfg.tokenizer_api_key)?,
        receipts: ReceiptsRepo::new(store.clone(), cfg.collections.receipts.clone()),
        biz_events: BizEventsRepo::new(store, cfg.collections.biz_events.clone()),
        helpdesk: HelpdeskClient::from_config(&cfg)?,
        settle: Duration::from_millis(cfg.regenerate_settle_ms),
        concurrency: args.concurrency.unwrap_or(cfg.regenerate_concurrency),
        dry_run: args.dry_run,
    });

    tracing::info!("regenerating pdfs for {} fiscal codes", fiscal_codes.len());
    let report = service.run(fiscal_codes).await;
    let regenerated = report.receipts.iter().filter(|r| r.succeeded()).count();
    tracing::info!(
        "regeneration done: {} receipts ok, {} receipts failed, {} fiscal codes failed",
        regenerated,
        report.receipts.len() - regenerated,
        report.failures.len()
    );

    if report.has_failures() {
        bail!("regeneration finished with failures");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fiscal_code_file_skips_blank_and_comment_lines() {
        let codes = parse_fiscal_codes("AAAAAA00A00A000A\n\n# done already\n  BBBBBB00B00B000B  \n");
        assert_eq!(codes, vec!["AAAAAA00A00A000A", "BBBBBB00B00B000B"]);
    }
}
