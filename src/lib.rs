pub mod blob;
pub mod config;
pub mod domain {
    pub mod biz_event;
    pub mod cart;
    pub mod receipt;
    pub mod receipt_error;
    pub mod receipt_message;
    pub mod wire;
}
pub mod fixtures;
pub mod helpdesk;
pub mod repo {
    pub mod biz_events_repo;
    pub mod carts_repo;
    pub mod outcome;
    pub mod receipt_errors_repo;
    pub mod receipt_messages_repo;
    pub mod receipts_repo;
}
pub mod scenario;
pub mod service {
    pub mod cleanup;
    pub mod regeneration;
}
pub mod store;
pub mod tokenizer;
pub mod wait;
