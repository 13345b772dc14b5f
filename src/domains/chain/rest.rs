//! Aptos fullnode REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{ChainClient, ChainError};

#[derive(Serialize)]
struct ViewRequest<'a> {
    function: &'a str,
    type_arguments: Vec<String>,
    arguments: Vec<Value>,
}

/// `ChainClient` over the fullnode REST API (`/v1`).
pub struct AptosRestClient {
    base_url: String,
    client: reqwest::Client,
}

impl AptosRestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hyperfill-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ChainError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Node errors carry a `message` field; fall back to the raw body.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(ChainError::api(status.as_u16(), message));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChainClient for AptosRestClient {
    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, ChainError> {
        debug!(function, "Aptos view call");
        let response = self
            .client
            .post(format!("{}/view", self.base_url))
            .json(&ViewRequest {
                function,
                type_arguments: Vec::new(),
                arguments,
            })
            .send()
            .await?;

        match Self::read_json(response).await? {
            Value::Array(values) => Ok(values),
            other => Err(ChainError::invalid_response(format!(
                "view returned a non-array value: {other}"
            ))),
        }
    }

    async fn account_resource(&self, account: &str, resource_type: &str) -> Result<Value, ChainError> {
        debug!(account, resource_type, "Aptos resource read");
        let response = self
            .client
            .get(format!(
                "{}/accounts/{}/resource/{}",
                self.base_url, account, resource_type
            ))
            .send()
            .await?;

        let mut body = Self::read_json(response).await?;
        body.get_mut("data")
            .map(Value::take)
            .ok_or_else(|| ChainError::invalid_response("resource without a data field"))
    }
}
