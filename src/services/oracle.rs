//! The external language model, behind a single request/response call.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
}

impl OracleRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle is not configured (missing API key)")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle returned no text content")]
    EmptyResponse,
}

impl From<OracleError> for AppError {
    fn from(e: OracleError) -> Self {
        AppError::OracleUnavailable(e.to_string())
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one request and return the raw text of the reply.
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// Anthropic Messages API client.
pub struct ClaudeOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeOracle {
    pub fn new(config: &Config) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.claude_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.claude_api_key.clone(),
            model: config.claude_model.clone(),
            base_url: config.claude_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn body(&self, request: &OracleRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [{
                "role": "user",
                "content": request.prompt,
            }],
        });
        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }
        body
    }
}

#[async_trait]
impl Oracle for ClaudeOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        if self.api_key.is_empty() {
            return Err(OracleError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&self.body(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        extract_text(&payload).ok_or(OracleError::EmptyResponse)
    }
}

/// Concatenate the text blocks of a Messages API response. The only change
/// made to the text is trimming surrounding whitespace.
pub fn extract_text(payload: &Value) -> Option<String> {
    let text: String = payload
        .get("content")?
        .as_array()?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
pub use fake::ScriptedOracle;
