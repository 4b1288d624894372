use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Personal-data vault client mapping fiscal codes to the tokens stored in receipts.
#[derive(Clone)]
pub struct TokenizerClient {
    pub base_url: String,
    pub api_key: String,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResource {
    token: String,
}

#[derive(Debug, Deserialize)]
struct PiiResource {
    pii: String,
}

impl TokenizerClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            client,
        })
    }

    pub async fn search_token(&self, pii: &str) -> Result<String> {
        let url = format!("{}tokens/search", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({ "pii": pii }))
            .send()
            .await
            .context("tokenizer search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("tokenizer search answered {status}"));
        }
        let body: TokenResource = resp.json().await.context("tokenizer search returned no token")?;
        Ok(body.token)
    }

    pub async fn get_pii(&self, token: &str) -> Result<String> {
        let url = format!("{}tokens/{}/pii", self.base_url, token);
        let resp = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .context("tokenizer pii request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("tokenizer pii lookup answered {status}"));
        }
        let body: PiiResource = resp.json().await?;
        Ok(body.pii)
    }
}
