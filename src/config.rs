use anyhow::{bail, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub get_receipt: String,
    pub get_receipt_by_org_and_iuv: String,
    pub get_receipt_message: String,
    pub get_receipt_error: String,
    pub get_receipt_pdf: String,
    pub get_cart: String,
    pub receipt_to_reviewed: String,
    pub recover_failed: String,
    pub recover_failed_massive: String,
    pub recover_not_notified: String,
    pub recover_not_notified_massive: String,
    pub regenerate_receipt_pdf: String,
    pub recover_failed_cart: String,
    pub recover_failed_cart_massive: String,
}

#[derive(Debug, Clone)]
pub struct Collections {
    pub biz_events: String,
    pub receipts: String,
    pub receipt_errors: String,
    pub receipt_messages: String,
    pub carts: String,
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub container: String,
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub helpdesk_url: Option<String>,
    pub subscription_key: String,
    pub canary: bool,
    pub environment: String,
    pub endpoints: Endpoints,
    pub database_url: Option<String>,
    pub collections: Collections,
    pub blob: BlobConfig,
    pub tokenizer_url: Option<String>,
    pub tokenizer_api_key: String,
    pub scenario_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub regenerate_settle_ms: u64,
    pub regenerate_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let helpdesk_url = get("HELPDESK_URL").map(|mut url| {
            if !url.ends_with('/') {
                url.push('/');
            }
            url
        });

        Ok(Self {
            helpdesk_url,
            subscription_key: get("SUBKEY").unwrap_or_default(),
            canary: get("CANARY").or_else(|| get("canary")).is_some(),
            environment: or("ENVIRONMENT", "local"),
            endpoints: Endpoints {
                get_receipt: or("GET_RECEIPT_ENDPOINT", "receipts/{event-id}"),
                get_receipt_by_org_and_iuv: or(
                    "GET_RECEIPT_BY_ORGCODE_AND_IUV_ENDPOINT",
                    "receipts/organizations/{organization-fiscal-code}/iuvs/{iuv}",
                ),
                get_receipt_message: or("GET_RECEIPT_MESSAGE_ENDPOINT", "receipts/io-message/{message-id}"),
                get_receipt_error: or("GET_RECEIPT_ERROR_ENDPOINT", "errors-toreview/{bizevent-id}"),
                get_receipt_pdf: or("GET_RECEIPT_PDF_ENDPOINT", "pdf-receipts/{file-name}"),
                get_cart: or("GET_CART_ENDPOINT", "cart/{cart-id}"),
                receipt_to_reviewed: or("RECEIPT_TO_REVIEW_ENDPOINT", "receipts-error/{event-id}/reviewed"),
                recover_failed: or("RECOVER_FAILED_ENDPOINT", "receipts/{event-id}/recover-failed"),
                recover_failed_massive: or(
                    "RECOVER_FAILED_MASSIVE_ENDPOINT",
                    "receipts/recover-failed?status={status}",
                ),
                recover_not_notified: or(
                    "RECOVER_NOT_NOTIFIED_ENDPOINT",
                    "receipts/{event-id}/recover-not-notified",
                ),
                recover_not_notified_massive: or(
                    "RECOVER_NOT_NOTIFIED_MASSIVE_ENDPOINT",
                    "receipts/recover-not-notified?status={status}",
                ),
                regenerate_receipt_pdf: or(
                    "REGENERATE_RECEIPT_PDF_ENDPOINT",
                    "receipts/{bizevent-id}/regenerate-receipt-pdf",
                ),
                recover_failed_cart: or("RECOVER_FAILED_CART_ENDPOINT", "carts/{cart-id}/recover-failed"),
                recover_failed_cart_massive: or(
                    "RECOVER_FAILED_CART_MASSIVE_ENDPOINT",
                    "carts/recover-failed?status={status}",
                ),
            },
            database_url: get("DATABASE_URL"),
            collections: Collections {
                biz_events: or("BIZ_EVENT_COLLECTION", "biz-events"),
                receipts: or("RECEIPT_COLLECTION", "receipts"),
                receipt_errors: or("RECEIPT_ERROR_COLLECTION", "receipts-message-errors"),
                receipt_messages: or("RECEIPT_MESSAGE_COLLECTION", "receipts-io-messages"),
                carts: or("CART_COLLECTION", "cart-for-receipts"),
            },
            blob: BlobConfig {
                container: or("BLOB_STORAGE_CONTAINER_NAME", "pagopa-receipts"),
                endpoint: get("BLOB_STORAGE_ENDPOINT"),
                region: get("BLOB_STORAGE_REGION"),
            },
            tokenizer_url: get("TOKENIZER_URL"),
            tokenizer_api_key: get("TOKENIZER_API_KEY").unwrap_or_default(),
            scenario_timeout_secs: parse_or(get("SCENARIO_TIMEOUT_SEC"), 360)?,
            poll_interval_ms: parse_or(get("POLL_INTERVAL_MS"), 500)?,
            regenerate_settle_ms: parse_or(get("REGENERATE_SETTLE_MS"), 10_000)?,
            regenerate_concurrency: parse_or(get("REGENERATE_CONCURRENCY"), 4)?,
        })
    }

    pub fn require_helpdesk_url(&self) -> Result<&str> {
        match self.helpdesk_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!("HELPDESK_URL must be set"),
        }
    }

    pub fn require_database_url(&self) -> Result<&str> {
        match self.database_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!("DATABASE_URL must be set"),
        }
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid numeric value {raw:?}: {e}")),
    }
}

/// Substitutes every `{name}` placeholder found in `params`, encoding the value so it
/// stays inside a single path segment or query value. Unknown placeholders are kept.
pub fn render_template(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        out = out.replace(&format!("{{{name}}}"), &encoded);
    }
    out
}
