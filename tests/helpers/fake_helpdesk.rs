// In-process stand-in for the receipt helpdesk and the tokenizer, backed by the
// same in-memory stores the tests seed.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use receipt_helpdesk_harness::blob::mock::MockBlobStore;
use receipt_helpdesk_harness::blob::BlobStore;
use receipt_helpdesk_harness::config::Collections;
use receipt_helpdesk_harness::store::mock::MockDocumentStore;
use receipt_helpdesk_harness::store::{DocumentStore, Filter, PatchOp};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub subscription_key: Option<String>,
    pub canary: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone)]
struct FakeState {
    store: MockDocumentStore,
    blobs: MockBlobStore,
    collections: Collections,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    load: Arc<Load>,
}

/// Requests being served right now, the highest count seen, and an artificial delay per request.
#[derive(Default)]
struct Load {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    latency_ms: AtomicU64,
}

pub struct FakeHelpdesk {
    pub url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    load: Arc<Load>,
    server: tokio::task::JoinHandle<()>,
}

impl FakeHelpdesk {
    pub async fn start(store: MockDocumentStore, blobs: MockBlobStore, collections: Collections) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let load = Arc::new(Load::default());
        let state = FakeState {
            store,
            blobs,
            collections,
            calls: calls.clone(),
            load: load.clone(),
        };
        let app = Router::new().route("/*path", any(dispatch)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/api/"),
            calls,
            load,
            server,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Every request is held for `latency` before it is answered.
    pub fn set_latency(&self, latency: Duration) {
        self.load.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn peak_in_flight(&self) -> usize {
        self.load.peak.load(Ordering::SeqCst)
    }
}

impl Drop for FakeHelpdesk {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found(what: &str) -> Response {
    json_response(StatusCode::NOT_FOUND, json!({ "title": "Not found", "detail": what }))
}

fn bad_request(what: &str) -> Response {
    json_response(StatusCode::BAD_REQUEST, json!({ "title": "Bad request", "detail": what }))
}

async fn dispatch(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Ok(mut calls) = state.calls.lock() {
        calls.push(RecordedCall {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            subscription_key: header(&headers, "ocp-apim-subscription-key"),
            canary: header(&headers, "x-canary"),
            api_key: header(&headers, "x-api-key"),
        });
    }

    let load = &state.load;
    let current = load.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    load.peak.fetch_max(current, Ordering::SeqCst);
    let latency = load.latency_ms.load(Ordering::SeqCst);
    if latency > 0 {
        tokio::time::sleep(Duration::from_millis(latency)).await;
    }
    let response = route(&state, &method, &uri, &query).await;
    load.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

async fn route(state: &FakeState, method: &Method, uri: &Uri, query: &HashMap<String, String>) -> Response {
    let Some(path) = uri.path().strip_prefix("/api/") else {
        return not_found("unknown base path");
    };
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return bad_request("missing path parameter");
    }

    let c = &state.collections;
    let status = query.get("status").map(String::as_str);
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["receipts", "organizations", org, "iuvs", iuv]) => receipt_by_org_and_iuv(state, org, iuv).await,
        ("GET", ["receipts", "io-message", message_id]) => {
            first_or_404(state, &c.receipt_messages, Filter::eq("messageId", message_id)).await
        }
        ("GET", ["receipts", event_id]) => first_or_404(state, &c.receipts, Filter::eq("eventId", event_id)).await,
        ("GET", ["errors-toreview", biz_event_id]) => receipt_error(state, biz_event_id).await,
        ("GET", ["pdf-receipts", file_name]) => match state.blobs.exists(file_name).await {
            Ok(true) => (StatusCode::OK, "%PDF").into_response(),
            _ => not_found("pdf not found"),
        },
        ("GET", ["cart", cart_id]) => first_or_404(state, &c.carts, Filter::eq("id", cart_id)).await,
        ("POST", ["receipts-error", event_id, "reviewed"]) => {
            set_status(state, &c.receipt_errors, Filter::eq("bizEventId", event_id), "id", "REVIEWED").await
        }
        ("POST", ["receipts", "recover-failed"]) => {
            let allowed = ["FAILED", "NOT_QUEUE_SENT", "INSERTED"];
            massive(state, &c.receipts, RECEIPT_PK, status, &allowed, "GENERATED").await
        }
        ("POST", ["receipts", "recover-not-notified"]) => {
            let allowed = ["IO_ERROR_TO_NOTIFY", "GENERATED"];
            massive(state, &c.receipts, RECEIPT_PK, status, &allowed, "IO_NOTIFIED").await
        }
        ("POST", ["receipts", event_id, "recover-failed"]) => {
            set_status(state, &c.receipts, Filter::eq("eventId", event_id), RECEIPT_PK, "GENERATED").await
        }
        ("POST", ["receipts", event_id, "recover-not-notified"]) => {
            set_status(state, &c.receipts, Filter::eq("eventId", event_id), RECEIPT_PK, "IO_NOTIFIED").await
        }
        ("POST", ["receipts", biz_event_id, "regenerate-receipt-pdf"]) => {
            match state.store.query(&c.biz_events, &Filter::eq("id", biz_event_id)).await {
                Ok(found) if !found.is_empty() => json_response(StatusCode::OK, json!({})),
                _ => not_found("biz event not found"),
            }
        }
        ("POST", ["carts", "recover-failed"]) => {
            massive(state, &c.carts, "id", status, &["FAILED"], "SENT").await
        }
        ("POST", ["carts", cart_id, "recover-failed"]) => set_status(state, &c.carts, Filter::eq("id", cart_id), "id", "SENT").await,
        ("POST", ["tokens", "search"]) => json_response(StatusCode::OK, json!({ "token": "cd07268c-73e8-4df4-8305-a35085e32eff" })),
        ("GET", ["tokens", token, "pii"]) => json_response(StatusCode::OK, json!({ "pii": format!("pii-of-{token}") })),
        _ => not_found("no such route"),
    }
}

async fn first_or_404(state: &FakeState, collection: &str, filter: Filter) -> Response {
    match state.store.query(collection, &filter).await {
        Ok(found) => match found.into_iter().next() {
            Some(doc) => json_response(StatusCode::OK, doc),
            None => not_found("document not found"),
        },
        Err(e) => json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": e.to_string() })),
    }
}

async fn receipt_by_org_and_iuv(state: &FakeState, org: &str, iuv: &str) -> Response {
    let c = &state.collections;
    let Ok(events) = state.store.query(&c.biz_events, &Filter::eq("creditor.idPA", org)).await else {
        return not_found("store error");
    };
    let event_id = events
        .iter()
        .find(|e| e.pointer("/debtorPosition/iuv").and_then(Value::as_str) == Some(iuv))
        .and_then(|e| e.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);
    match event_id {
        Some(event_id) => first_or_404(state, &c.receipts, Filter::eq("eventId", &event_id)).await,
        None => not_found("biz event not found"),
    }
}

/// The real service decrypts `messagePayload`; here it is replaced by a plain biz-event.
async fn receipt_error(state: &FakeState, biz_event_id: &str) -> Response {
    let c = &state.collections;
    match state.store.query(&c.receipt_errors, &Filter::eq("bizEventId", biz_event_id)).await {
        Ok(found) => match found.into_iter().next() {
            Some(mut doc) => {
                doc["messagePayload"] = Value::String(json!({ "id": biz_event_id }).to_string());
                json_response(StatusCode::OK, doc)
            }
            None => not_found("receipt-error not found"),
        },
        Err(_) => not_found("store error"),
    }
}

/// Receipts are partitioned by the event they were generated for.
const RECEIPT_PK: &str = "eventId";

fn key_of<'a>(doc: &'a Value, pk_field: &str) -> Option<(&'a str, &'a str)> {
    let id = doc.get("id").and_then(Value::as_str)?;
    let pk = doc.get(pk_field).and_then(Value::as_str)?;
    Some((id, pk))
}

async fn set_status(state: &FakeState, collection: &str, filter: Filter, pk_field: &str, status: &str) -> Response {
    let Ok(found) = state.store.query(collection, &filter).await else {
        return not_found("store error");
    };
    if found.is_empty() {
        return not_found("document not found");
    }
    for doc in &found {
        if let Some((id, pk)) = key_of(doc, pk_field) {
            let _ = state
                .store
                .patch(collection, id, pk, &[PatchOp::replace("status", json!(status))])
                .await;
        }
    }
    json_response(StatusCode::OK, json!({}))
}

async fn massive(
    state: &FakeState,
    collection: &str,
    pk_field: &str,
    status: Option<&str>,
    allowed: &[&str],
    target: &str,
) -> Response {
    let Some(status) = status.filter(|s| allowed.contains(s)) else {
        return bad_request("invalid status");
    };
    let Ok(found) = state.store.query(collection, &Filter::eq("status", status)).await else {
        return not_found("store error");
    };
    for doc in &found {
        if let Some((id, pk)) = key_of(doc, pk_field) {
            let _ = state
                .store
                .patch(collection, id, pk, &[PatchOp::replace("status", json!(target))])
                .await;
        }
    }
    json_response(StatusCode::OK, json!({ "updatedRecords": found.len() }))
}
