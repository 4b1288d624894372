use crate::config::{render_template, AppConfig, Endpoints};
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";
const CANARY_HEADER: &str = "x-canary";

/// What the helpdesk answered. `status == 0` means no HTTP response was received.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub raw: String,
    pub transport_error: Option<String>,
}

impl ApiResponse {
    fn transport(err: reqwest::Error) -> Self {
        Self {
            status: 0,
            body: Value::Null,
            raw: String::new(),
            transport_error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// String field of a JSON object body.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }
}

#[derive(Clone)]
pub struct HelpdeskClient {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub client: reqwest::Client,
}

impl HelpdeskClient {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.require_helpdesk_url()?,
            config.endpoints.clone(),
            &config.subscription_key,
            config.canary,
        )
    }

    pub fn new(base_url: &str, endpoints: Endpoints, subscription_key: &str, canary: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(SUBSCRIPTION_KEY_HEADER),
            HeaderValue::from_str(subscription_key)?,
        );
        if canary {
            headers.insert(HeaderName::from_static(CANARY_HEADER), HeaderValue::from_static("canary"));
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            base_url,
            endpoints,
            client,
        })
    }

    pub async fn get_receipt(&self, event_id: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.get_receipt, &[("event-id", event_id)]);
        self.send(Method::GET, &path).await
    }

    pub async fn get_receipt_by_org_and_iuv(&self, org_fiscal_code: &str, iuv: &str) -> ApiResponse {
        let path = render_template(
            &self.endpoints.get_receipt_by_org_and_iuv,
            &[("organization-fiscal-code", org_fiscal_code), ("iuv", iuv)],
        );
        self.send(Method::GET, &path).await
    }

    pub async fn get_receipt_message(&self, message_id: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.get_receipt_message, &[("message-id", message_id)]);
        self.send(Method::GET, &path).await
    }

    pub async fn get_receipt_error(&self, biz_event_id: &str) -> ApiResponse {
        // older deployments spell the placeholder `{bizvent-id}`
        let path = render_template(
            &self.endpoints.get_receipt_error,
            &[("bizevent-id", biz_event_id), ("bizvent-id", biz_event_id)],
        );
        self.send(Method::GET, &path).await
    }

    pub async fn get_receipt_pdf(&self, file_name: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.get_receipt_pdf, &[("file-name", file_name)]);
        self.send(Method::GET, &path).await
    }

    pub async fn get_cart(&self, cart_id: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.get_cart, &[("cart-id", cart_id)]);
        self.send(Method::GET, &path).await
    }

    pub async fn post_receipt_to_reviewed(&self, event_id: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.receipt_to_reviewed, &[("event-id", event_id)]);
        self.send(Method::POST, &path).await
    }

    /// Without an id the path keeps an empty segment, which the helpdesk must reject.
    pub async fn post_recover_failed(&self, event_id: Option<&str>) -> ApiResponse {
        let path = render_template(&self.endpoints.recover_failed, &[("event-id", event_id.unwrap_or(""))]);
        self.send(Method::POST, &path).await
    }

    pub async fn post_recover_failed_massive(&self, status: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.recover_failed_massive, &[("status", status)]);
        self.send(Method::POST, &path).await
    }

    pub async fn post_recover_not_notified(&self, event_id: Option<&str>) -> ApiResponse {
        let path = render_template(
            &self.endpoints.recover_not_notified,
            &[("event-id", event_id.unwrap_or(""))],
        );
        self.send(Method::POST, &path).await
    }

    pub async fn post_recover_not_notified_massive(&self, status: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.recover_not_notified_massive, &[("status", status)]);
        self.send(Method::POST, &path).await
    }

    pub async fn post_regenerate_receipt_pdf(&self, biz_event_id: &str) -> ApiResponse {
        let path = render_template(
            &self.endpoints.regenerate_receipt_pdf,
            &[("bizevent-id", biz_event_id)],
        );
        self.send(Method::POST, &path).await
    }

    pub async fn post_recover_failed_cart(&self, cart_id: Option<&str>) -> ApiResponse {
        let path = render_template(&self.endpoints.recover_failed_cart, &[("cart-id", cart_id.unwrap_or(""))]);
        self.send(Method::POST, &path).await
    }

    pub async fn post_recover_failed_cart_massive(&self, status: &str) -> ApiResponse {
        let path = render_template(&self.endpoints.recover_failed_cart_massive, &[("status", status)]);
        self.send(Method::POST, &path).await
    }

    async fn send(&self, method: Method, path: &str) -> ApiResponse {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if method == Method::POST {
            request = request.json(&json!({}));
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%method, %url, error = %e, "helpdesk request failed");
                return ApiResponse::transport(e);
            }
        };

        let status = resp.status().as_u16();
        let raw = match resp.text().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%method, %url, status, error = %e, "could not read helpdesk response body");
                String::new()
            }
        };
        let body = serde_json::from_str(&raw).unwrap_or(Value::Null);
        debug!(%method, %url, status, "helpdesk responded");

        ApiResponse {
            status,
            body,
            raw,
            transport_error: None,
        }
    }
}
