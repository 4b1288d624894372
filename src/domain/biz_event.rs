use crate::domain::wire::{self, UnknownValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BizEventStatus {
    Na,
    Retry,
    Failed,
    Done,
    Ingested,
}

impl FromStr for BizEventStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        wire::parse(s, "biz-event status")
    }
}

impl fmt::Display for BizEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wire::name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorPosition {
    pub model_type: String,
    pub notice_number: String,
    pub iuv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creditor {
    #[serde(rename = "idPA")]
    pub id_pa: String,
    #[serde(rename = "idBrokerPA")]
    pub id_broker_pa: String,
    #[serde(rename = "idStation")]
    pub id_station: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
    #[serde(rename = "officeName")]
    pub office_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Psp {
    pub id_psp: String,
    pub id_broker_psp: String,
    pub id_channel: String,
    pub psp: String,
    pub psp_fiscal_code: String,
    pub channel_description: String,
}

/// Debtor and payer share the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub full_name: String,
    pub entity_unique_identifier_type: String,
    pub entity_unique_identifier_value: String,
    pub street_name: String,
    pub civic_number: String,
    pub postal_code: String,
    pub city: String,
    pub state_province_region: String,
    pub country: String,
    #[serde(rename = "eMail")]
    pub e_mail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub payment_date_time: String,
    pub application_date: String,
    pub transfer_date: String,
    pub due_date: String,
    pub payment_token: String,
    pub amount: String,
    pub fee: String,
    pub total_notice: String,
    pub payment_method: String,
    pub touchpoint: String,
    pub remittance_information: String,
    pub description: String,
    #[serde(default)]
    pub metadata: Vec<MapEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id_transfer: String,
    #[serde(rename = "fiscalCodePA")]
    pub fiscal_code_pa: String,
    pub company_name: String,
    pub amount: String,
    pub transfer_category: String,
    pub remittance_information: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUser {
    pub full_name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub fiscal_code: String,
    pub notification_email: String,
    pub user_id: String,
    pub user_status: String,
    pub user_status_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id_transaction: i64,
    pub transaction_id: i64,
    pub grand_total: i64,
    pub amount: i64,
    pub fee: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub user: TransactionUser,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BizEvent {
    pub id: String,
    pub version: String,
    pub id_payment_manager: String,
    pub complete: String,
    pub receipt_id: String,
    #[serde(default)]
    pub missing_info: Vec<String>,
    pub debtor_position: DebtorPosition,
    pub creditor: Creditor,
    pub psp: Psp,
    pub debtor: Subject,
    pub payer: Option<Subject>,
    pub payment_info: PaymentInfo,
    #[serde(default)]
    pub transfer_list: Vec<Transfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_details: Option<TransactionDetails>,
    pub timestamp: i64,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub event_status: BizEventStatus,
    #[serde(default)]
    pub event_retry_enrichment_count: i32,
}

impl BizEvent {
    /// Cart linkage, when the event belongs to a multi-notice payment.
    pub fn transaction_id(&self) -> Option<i64> {
        self.transaction_details
            .as_ref()
            .map(|details| details.transaction.transaction_id)
    }
}
