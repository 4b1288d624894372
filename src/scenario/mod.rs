use crate::blob::BlobStore;
use crate::config::AppConfig;
use crate::domain::receipt::Receipt;
use crate::helpdesk::{ApiResponse, HelpdeskClient};
use crate::repo::biz_events_repo::BizEventsRepo;
use crate::repo::carts_repo::CartsRepo;
use crate::repo::receipt_errors_repo::ReceiptErrorsRepo;
use crate::repo::receipt_messages_repo::ReceiptMessagesRepo;
use crate::repo::receipts_repo::ReceiptsRepo;
use crate::store::DocumentStore;
use anyhow::{bail, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub mod exercise;
pub mod setup;
pub mod teardown;
pub mod verify;

pub use teardown::TeardownReport;

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub environment: String,
    /// Directory where local PDF fixtures are written before upload.
    pub work_dir: PathBuf,
}

impl ScenarioSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.scenario_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            environment: config.environment.clone(),
            work_dir: std::env::temp_dir(),
        }
    }
}

/// Gateways shared by every scenario of a run.
pub struct Harness {
    pub biz_events: BizEventsRepo,
    pub receipts: ReceiptsRepo,
    pub receipt_errors: ReceiptErrorsRepo,
    pub receipt_messages: ReceiptMessagesRepo,
    pub carts: CartsRepo,
    pub blobs: Arc<dyn BlobStore>,
    pub helpdesk: HelpdeskClient,
    pub settings: ScenarioSettings,
}

impl Harness {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        helpdesk: HelpdeskClient,
    ) -> Self {
        let collections = &config.collections;
        Self {
            biz_events: BizEventsRepo::new(store.clone(), collections.biz_events.clone()),
            receipts: ReceiptsRepo::new(store.clone(), collections.receipts.clone()),
            receipt_errors: ReceiptErrorsRepo::new(store.clone(), collections.receipt_errors.clone()),
            receipt_messages: ReceiptMessagesRepo::new(store.clone(), collections.receipt_messages.clone()),
            carts: CartsRepo::new(store, collections.carts.clone()),
            blobs,
            helpdesk,
            settings: ScenarioSettings::from_config(config),
        }
    }
}

/// Everything a scenario created, so teardown can remove it.
#[derive(Debug, Default, Clone)]
pub struct Tracked {
    pub biz_event_ids: Vec<String>,
    pub receipt_event_ids: Vec<String>,
    pub receipt_error_ids: Vec<String>,
    pub message_ids: Vec<String>,
    pub cart_ids: Vec<String>,
    pub blob_names: Vec<String>,
    pub local_files: Vec<PathBuf>,
}

impl Tracked {
    /// A biz-event id also owns the receipts and receipt-errors generated from it.
    pub fn event(&mut self, id: &str) {
        push_unique(&mut self.biz_event_ids, id);
        push_unique(&mut self.receipt_event_ids, id);
        push_unique(&mut self.receipt_error_ids, id);
    }

    pub fn message(&mut self, id: &str) {
        push_unique(&mut self.message_ids, id);
    }

    pub fn cart(&mut self, id: &str) {
        push_unique(&mut self.cart_ids, id);
    }

    pub fn blob(&mut self, name: &str) {
        push_unique(&mut self.blob_names, name);
    }

    pub fn local_file(&mut self, path: PathBuf) {
        if !self.local_files.contains(&path) {
            self.local_files.push(path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.biz_event_ids.is_empty()
            && self.receipt_event_ids.is_empty()
            && self.receipt_error_ids.is_empty()
            && self.message_ids.is_empty()
            && self.cart_ids.is_empty()
            && self.blob_names.is_empty()
            && self.local_files.is_empty()
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|known| known == id) {
        ids.push(id.to_string());
    }
}

/// State of one scenario, created fresh before its first step and cleared by teardown.
pub struct ScenarioContext {
    pub harness: Arc<Harness>,
    deadline: Instant,
    pub tracked: Tracked,
    pub last_response: Option<ApiResponse>,
    pub receipt: Option<Value>,
    pub receipt_error: Option<Value>,
    pub receipt_message: Option<Value>,
    pub cart: Option<Value>,
    /// Receipts from the last list fixture or datastore read.
    pub receipts: Vec<Receipt>,
    pub pdf_file_name: Option<String>,
}

impl ScenarioContext {
    pub fn new(harness: Arc<Harness>) -> Self {
        let deadline = Instant::now() + harness.settings.timeout;
        Self {
            harness,
            deadline,
            tracked: Tracked::default(),
            last_response: None,
            receipt: None,
            receipt_error: None,
            receipt_message: None,
            cart: None,
            receipts: Vec::new(),
            pdf_file_name: None,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Fails the step once the scenario has used up its time budget.
    pub fn check_budget(&self, step: &str) -> Result<()> {
        if Instant::now() >= self.deadline {
            bail!(
                "scenario exceeded its {:?} budget before step `{step}`",
                self.harness.settings.timeout
            );
        }
        Ok(())
    }

    /// Poll window for a verification: the requested window, never past the deadline.
    pub(crate) fn poll_window(&self, requested: Option<Duration>) -> Duration {
        let remaining = self.remaining();
        requested.map_or(remaining, |r| r.min(remaining))
    }

    pub(crate) fn last_response(&self) -> Result<&ApiResponse> {
        match self.last_response.as_ref() {
            Some(resp) => Ok(resp),
            None => bail!("no API call was made in this scenario"),
        }
    }
}

pub(crate) fn str_field<'a>(doc: Option<&'a Value>, name: &str) -> Option<&'a str> {
    doc.and_then(|d| d.get(name)).and_then(Value::as_str)
}
