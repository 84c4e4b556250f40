//! Language model service boundary.
//!
//! Defines the message/content data model shared by the agent loop and the
//! concrete API client, plus the [`ChatModel`] trait that the loop drives.
//! Model output is validated into tagged variants here, at the boundary, so
//! the rest of the crate matches on enums instead of sniffing JSON.

mod anthropic;

pub use anthropic::AnthropicClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single content block, tagged the way the Messages API tags them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Narrative text.
    Text { text: String },
    /// A tool invocation requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// The outcome of a tool invocation, sent back to the model.
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Message content: plain text for simple turns, blocks for tool rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One turn in an exchange. Turns are append-only: a round extends a copied
/// sequence rather than mutating messages already sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// Create a plain-text user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant turn carrying the model's raw content blocks.
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Create the user-role turn that carries tool results back to the model.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results),
        }
    }
}

/// Declared schema for a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Why the model stopped producing output for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model is done; the round carries the answer (or nothing).
    End,
    /// The model wants one or more tools invoked before continuing.
    ToolRequested,
}

/// A tool invocation the model asked for, extracted from a round's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Validated outcome of a single model round.
///
/// A round may legally carry both narrative text and tool requests at the
/// same time; accessors below expose each view of the content.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl RoundOutcome {
    /// Synthesize a terminal outcome carrying only descriptive text.
    /// Used when the service call itself fails, so the loop can still answer.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::End,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Trimmed, non-empty text blocks in content order.
    pub fn text_blocks(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then_some(trimmed)
                }
                _ => None,
            })
            .collect()
    }

    /// Tool requests in content order.
    pub fn tool_requests(&self) -> Vec<ToolRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolRequest {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// The final answer text: all text blocks joined by single spaces.
    /// Returns `None` when the round carried no usable text.
    pub fn final_text(&self) -> Option<String> {
        let blocks = self.text_blocks();
        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join(" "))
        }
    }
}

/// Outbound request for one model round.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
    /// Tools offered this round. Empty means no tools are sent at all.
    pub tools: Vec<ToolSchema>,
}

/// Trait for the language-model service.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one request/response round against the model service.
    async fn complete(&self, request: &ModelRequest) -> Result<RoundOutcome>;
}
