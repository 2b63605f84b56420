//! Provider trait — the abstraction over the LLM completion endpoint.
//!
//! A Provider knows how to send a thread to an LLM and get a completion back.
//! It is stateless across calls: every request carries the full thread, no
//! server-side session is assumed.
//!
//! Two request shapes are supported:
//! - chat-completions mode ([`CompletionRequest`]) with optional tool schemas,
//!   used by the tool-calling and agent workflows;
//! - responses "input" mode ([`ResponsesRequest`]) taking a single string or a
//!   list of role/content messages, used by one-shot and plain multi-turn chat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::message::{Message, Role, Thread, ToolCall, WireMessage};

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A chat-completions request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-5-mini")
    pub model: String,

    /// The full thread, already projected to the wire format
    pub messages: Vec<WireMessage>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, thread: &Thread) -> Self {
        Self {
            model: model.into(),
            messages: thread.to_wire_format(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// A complete (non-streaming) chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    /// The generated assistant message (text and/or tool calls)
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl CompletionResult {
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// True when the model answered with text and requested no tools.
    pub fn is_terminal(&self) -> bool {
        self.message.tool_calls.is_empty() && !self.message.content.is_empty()
    }
}

/// A role/content pair for the responses "input" mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: String,
}

/// The `input` of a responses request: either a bare string or a message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesInput {
    Text(String),
    Messages(Vec<InputMessage>),
}

impl From<&str> for ResponsesInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<&Thread> for ResponsesInput {
    fn from(thread: &Thread) -> Self {
        Self::Messages(thread.to_input_messages())
    }
}

/// A responses-mode request. Serializes to exactly the JSON body sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    pub model: String,

    pub input: ResponsesInput,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// The distilled result of a responses-mode request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesResult {
    pub id: String,
    pub model: String,
    pub output_text: String,
    pub created_at: DateTime<Utc>,
    pub usage: Option<Usage>,
}

/// The core Provider trait.
///
/// The agent loop and the sessions call `complete()` / `respond()` without
/// knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the full thread (and tool schemas) and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, CompletionError>;

    /// Send a responses-mode request.
    ///
    /// Default implementation returns an error indicating the mode isn't supported.
    async fn respond(&self, _request: ResponsesRequest) -> Result<ResponsesResult, CompletionError> {
        Err(CompletionError::NotConfigured(format!(
            "Provider '{}' does not support the responses input mode",
            self.name()
        )))
    }
}
