use crate::domain::receipt::ReasonError;
use crate::domain::wire::{self, UnknownValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    Inserted,
    Failed,
    Sent,
}

impl FromStr for CartStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        wire::parse(s, "cart status")
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wire::name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    /// Ids of the biz-events paid together in this cart.
    pub cart_payment_id: Vec<String>,
    pub total_notice: i32,
    pub status: CartStatus,
    #[serde(rename = "inserted_at", default)]
    pub inserted_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_error: Option<ReasonError>,
}
