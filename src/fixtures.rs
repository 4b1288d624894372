use crate::domain::biz_event::{
    BizEvent, BizEventStatus, Creditor, DebtorPosition, MapEntry, PaymentInfo, Psp, Subject, Transaction,
    TransactionDetails, TransactionUser, Transfer,
};
use crate::domain::cart::{Cart, CartStatus};
use crate::domain::receipt::{CartItem, EventData, Receipt, ReceiptMetadata, ReceiptStatus};
use crate::domain::receipt_error::{ReceiptError, ReceiptErrorStatus};
use crate::domain::receipt_message::{ReceiptMessage, UserType};
use rand::Rng;

pub const TOKENIZED_FISCAL_CODE: &str = "cd07268c-73e8-4df4-8305-a35085e32eff";
pub const FISCAL_CODE: &str = "AAAAAA00A00A000A";
pub const FIXTURE_PDF_NAME: &str = "helpdesk-pdf-p.pdf";

const TOKENIZED_BIZ_EVENT_UAT: &str = include_str!("../fixtures/tokenized_biz_event_uat.txt");
const TOKENIZED_BIZ_EVENT_DEV: &str = include_str!("../fixtures/tokenized_biz_event_dev.txt");
const RECEIPT_AGE_MS: i64 = 360_000;

/// Encrypted biz-event understood by the helpdesk of the given environment.
pub fn tokenized_biz_event(environment: &str) -> &'static str {
    if environment.eq_ignore_ascii_case("uat") {
        TOKENIZED_BIZ_EVENT_UAT.trim()
    } else {
        TOKENIZED_BIZ_EVENT_DEV.trim()
    }
}

pub fn create_event(
    id: &str,
    status: Option<BizEventStatus>,
    org_code: Option<&str>,
    iuv: Option<&str>,
) -> BizEvent {
    BizEvent {
        id: id.to_string(),
        version: "2".to_string(),
        id_payment_manager: "54927408".to_string(),
        complete: "false".to_string(),
        receipt_id: "9851395f09544a04b288202299193ca6".to_string(),
        missing_info: vec![
            "psp.pspPartitaIVA".to_string(),
            "paymentInfo.primaryCiIncurredFee".to_string(),
            "paymentInfo.idBundle".to_string(),
            "paymentInfo.idCiBundle".to_string(),
        ],
        debtor_position: DebtorPosition {
            model_type: "2".to_string(),
            notice_number: "310391366991197059".to_string(),
            iuv: iuv.unwrap_or("iuv").to_string(),
        },
        creditor: Creditor {
            id_pa: org_code.unwrap_or("orgCode").to_string(),
            id_broker_pa: "66666666666".to_string(),
            id_station: "66666666666_08".to_string(),
            company_name: "PA paolo".to_string(),
            office_name: "office".to_string(),
        },
        psp: Psp {
            id_psp: "BNLIITRR".to_string(),
            id_broker_psp: "60000000001".to_string(),
            id_channel: "60000000001_08".to_string(),
            psp: "PSP Paolo".to_string(),
            psp_fiscal_code: "CF60000000006".to_string(),
            channel_description: "app".to_string(),
        },
        debtor: subject("paGetPaymentName", "paGetPayment", "paGetPayment@test.it"),
        payer: Some(subject("name", "", "prova@test.it")),
        payment_info: PaymentInfo {
            payment_date_time: "2023-03-17T16:37:36.955813".to_string(),
            application_date: "2021-12-12".to_string(),
            transfer_date: "2021-12-11".to_string(),
            due_date: "2021-12-12".to_string(),
            payment_token: "9851395f09544a04b288202299193ca6".to_string(),
            amount: "10.0".to_string(),
            fee: "2.0".to_string(),
            total_notice: "1".to_string(),
            payment_method: "creditCard".to_string(),
            touchpoint: "app".to_string(),
            remittance_information: "TARI 2021".to_string(),
            description: "TARI 2021".to_string(),
            metadata: vec![MapEntry {
                key: "1".to_string(),
                value: "22".to_string(),
            }],
        },
        transfer_list: vec![Transfer {
            id_transfer: "1".to_string(),
            fiscal_code_pa: "66666666666".to_string(),
            company_name: "PA paolo".to_string(),
            amount: "10.0".to_string(),
            transfer_category: "paGetPaymentTest".to_string(),
            remittance_information: "/RFB/00202200000217527/5.00/TXT/".to_string(),
        }],
        transaction_details: Some(TransactionDetails {
            user: TransactionUser {
                full_name: "John Doe".to_string(),
                user_type: "F".to_string(),
                fiscal_code: FISCAL_CODE.to_string(),
                notification_email: "john.doe@mail.it".to_string(),
                user_id: "1234".to_string(),
                user_status: "11".to_string(),
                user_status_description: "REGISTERED_SPID".to_string(),
            },
            transaction: Transaction {
                id_transaction: 123456,
                transaction_id: 123456,
                grand_total: 0,
                amount: 0,
                fee: 0,
            },
        }),
        timestamp: 1679067463501,
        properties: serde_json::Map::from_iter([
            (
                "diagnostic-id".to_string(),
                serde_json::json!("00-f70ef3167cffad76c6657a67a33ee0d2-61d794a75df0b43b-01"),
            ),
            ("serviceIdentifier".to_string(), serde_json::json!("NDP002SIT")),
        ]),
        event_status: status.unwrap_or(BizEventStatus::Done),
        event_retry_enrichment_count: 0,
    }
}

/// A biz-event paid inside a cart of `total_notice` notices sharing `transaction_id`.
pub fn create_event_for_cart(
    id: &str,
    transaction_id: i64,
    total_notice: usize,
    status: Option<BizEventStatus>,
) -> BizEvent {
    let mut event = create_event(id, status, None, None);
    event.payment_info.total_notice = total_notice.to_string();
    if let Some(details) = event.transaction_details.as_mut() {
        details.transaction.id_transaction = transaction_id;
        details.transaction.transaction_id = transaction_id;
    }
    event
}

fn subject(full_name: &str, prefix: &str, email: &str) -> Subject {
    let field = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}{}", capitalize(name))
        }
    };
    Subject {
        full_name: full_name.to_string(),
        entity_unique_identifier_type: "G".to_string(),
        entity_unique_identifier_value: FISCAL_CODE.to_string(),
        street_name: field("street"),
        civic_number: if prefix.is_empty() { "civic".to_string() } else { format!("{prefix}99") },
        postal_code: if prefix.is_empty() { "postal".to_string() } else { "20155".to_string() },
        city: field("city"),
        state_province_region: field("state"),
        country: "IT".to_string(),
        e_mail: email.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn create_receipt(id: &str, status: Option<ReceiptStatus>) -> Receipt {
    create_receipt_at(id, status, chrono::Utc::now().timestamp_millis())
}

pub fn create_receipt_at(id: &str, status: Option<ReceiptStatus>, now_ms: i64) -> Receipt {
    let status = status.unwrap_or(ReceiptStatus::Inserted);
    let attachment = status.has_pdf().then(|| ReceiptMetadata {
        name: FIXTURE_PDF_NAME.to_string(),
        url: FIXTURE_PDF_NAME.to_string(),
    });

    Receipt {
        id: id.to_string(),
        event_id: id.to_string(),
        version: None,
        event_data: Some(EventData {
            payer_fiscal_code: Some(TOKENIZED_FISCAL_CODE.to_string()),
            debtor_fiscal_code: Some(TOKENIZED_FISCAL_CODE.to_string()),
            transaction_creation_date: None,
            amount: Some("200".to_string()),
            cart: vec![CartItem {
                payee_name: "Comune di Milano".to_string(),
                subject: "ACI".to_string(),
            }],
        }),
        io_message_data: None,
        status,
        md_attach: attachment.clone(),
        md_attach_payer: attachment,
        num_retry: 0,
        notification_num_retry: 0,
        reason_err: None,
        reason_err_payer: None,
        inserted_at: now_ms - RECEIPT_AGE_MS,
        generated_at: now_ms - RECEIPT_AGE_MS,
        notified_at: 0,
        is_cart: false,
    }
}

pub fn create_receipt_error(id: &str, status: Option<ReceiptErrorStatus>, environment: &str) -> ReceiptError {
    ReceiptError {
        id: id.to_string(),
        biz_event_id: id.to_string(),
        message_payload: Some(tokenized_biz_event(environment).to_string()),
        message_error: Some("Unexpected error when decrypting the given string".to_string()),
        status: status.unwrap_or(ReceiptErrorStatus::ToReview),
    }
}

pub fn create_receipt_message(event_id: &str, message_id: &str) -> ReceiptMessage {
    ReceiptMessage {
        id: message_id.to_string(),
        message_id: message_id.to_string(),
        event_id: event_id.to_string(),
        user_type: UserType::Debtor,
    }
}

pub fn create_cart(id: &str, payment_ids: &[String], status: Option<CartStatus>) -> Cart {
    Cart {
        id: id.to_string(),
        cart_payment_id: payment_ids.to_vec(),
        total_notice: payment_ids.len() as i32,
        status: status.unwrap_or(CartStatus::Inserted),
        inserted_at: chrono::Utc::now().timestamp_millis() - RECEIPT_AGE_MS,
        reason_error: None,
    }
}

/// `start0 .. start{n-1}`: ids are concatenated, not added.
pub fn sequential_ids(start: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{start}{i}")).collect()
}

pub fn random_suffix(min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    rand::thread_rng().gen_range(min..max)
}
