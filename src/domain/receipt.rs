use crate::domain::wire::{self, UnknownValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    NotQueueSent,
    Inserted,
    Retry,
    Generated,
    Signed,
    Failed,
    IoNotified,
    IoErrorToNotify,
    IoNotifierRetry,
    UnableToSend,
    NotToNotify,
    ToReview,
}

impl ReceiptStatus {
    /// Statuses reached only after the PDF has been rendered and stored.
    pub fn has_pdf(self) -> bool {
        matches!(self, ReceiptStatus::Generated | ReceiptStatus::IoNotified)
    }
}

impl FromStr for ReceiptStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        wire::parse(s, "receipt status")
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wire::name(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptMetadata {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub payee_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub payer_fiscal_code: Option<String>,
    pub debtor_fiscal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_creation_date: Option<String>,
    pub amount: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoMessageData {
    pub id_message_debtor: Option<String>,
    pub id_message_payer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub event_data: Option<EventData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_message_data: Option<IoMessageData>,
    pub status: ReceiptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md_attach: Option<ReceiptMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md_attach_payer: Option<ReceiptMetadata>,
    #[serde(default)]
    pub num_retry: i32,
    #[serde(default)]
    pub notification_num_retry: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_err: Option<ReasonError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_err_payer: Option<ReasonError>,
    #[serde(rename = "inserted_at", default)]
    pub inserted_at: i64,
    #[serde(rename = "generated_at", default)]
    pub generated_at: i64,
    #[serde(rename = "notified_at", default)]
    pub notified_at: i64,
    #[serde(default)]
    pub is_cart: bool,
}

impl Receipt {
    /// Blob names referenced by the debtor and payer attachments, skipping placeholders.
    pub fn pdf_names(&self) -> Vec<&str> {
        [self.md_attach.as_ref(), self.md_attach_payer.as_ref()]
            .into_iter()
            .flatten()
            .map(|md| md.name.as_str())
            .filter(|name| name.len() > 1)
            .collect()
    }
}
