use crate::domain::wire::{self, UnknownValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptErrorStatus {
    ToReview,
    Reviewed,
    Requeued,
}

impl FromStr for ReceiptErrorStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        wire::parse(s, "receipt-error status")
    }
}

impl fmt::Display for ReceiptErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wire::name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptError {
    pub id: String,
    pub biz_event_id: String,
    /// Encrypted biz-event, opaque to this crate.
    pub message_payload: Option<String>,
    pub message_error: Option<String>,
    pub status: ReceiptErrorStatus,
}
