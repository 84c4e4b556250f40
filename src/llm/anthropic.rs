//! Anthropic Messages API client.
//!
//! Uses the native Messages API: `x-api-key` authentication, the
//! `anthropic-version` header, system prompt as a top-level field, and
//! tool use via `tool_use` / `tool_result` content blocks.

use super::{ChatModel, ContentBlock, ModelRequest, RoundOutcome, StopReason};
use crate::error::{CorsoError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default timeout for model requests (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AnthropicClient {
    /// Create a client with the default request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the base URL (for proxies and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn complete(&self, request: &ModelRequest) -> Result<RoundOutcome> {
        let url = format!("{}/v1/messages", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": request.messages,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools);
            body["tool_choice"] = serde_json::json!({"type": "auto"});
        }

        debug!(model = %request.model, messages = request.messages.len(), "Sending model request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Anthropic API error");
            return Err(CorsoError::Anthropic(format!(
                "status {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CorsoError::Anthropic(format!("Failed to parse response: {}", e)))?;

        Ok(api_response.into_outcome())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Response-side blocks. Only text and tool use appear in responses;
/// kept separate from [`ContentBlock`] so unrelated response block types
/// never leak past this boundary.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

impl ApiResponse {
    fn into_outcome(self) -> RoundOutcome {
        let stop_reason = match self.stop_reason.as_deref() {
            Some("tool_use") => StopReason::ToolRequested,
            _ => StopReason::End,
        };

        let content = self
            .content
            .into_iter()
            .map(|block| match block {
                ResponseBlock::Text { text } => ContentBlock::Text { text },
                ResponseBlock::ToolUse { id, name, input } => {
                    ContentBlock::ToolUse { id, name, input }
                }
            })
            .collect();

        RoundOutcome {
            stop_reason,
            content,
        }
    }
}
