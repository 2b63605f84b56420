//! Single-turn request/response through the responses input mode.
//!
//! Nothing here is persisted.

use serde::Serialize;
use threadloop_core::error::CompletionError;
use threadloop_core::message::Role;
use threadloop_core::provider::{InputMessage, Provider, ResponsesInput, ResponsesRequest, ResponsesResult};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone)]
pub struct OneShotRequest {
    pub model: String,
    pub message: String,
    /// Sent ahead of the message when present and not blank
    pub system_prompt: Option<String>,
    pub max_output_tokens: u32,
}

impl OneShotRequest {
    /// The exact request body that will be sent.
    ///
    /// With a system prompt the input is a two-message list; without one it
    /// is the bare user text.
    pub fn to_request(&self) -> ResponsesRequest {
        let input = match self.system_prompt.as_deref().map(str::trim) {
            Some(system) if !system.is_empty() => ResponsesInput::Messages(vec![
                InputMessage {
                    role: Role::System,
                    content: system.to_string(),
                },
                InputMessage {
                    role: Role::User,
                    content: self.message.clone(),
                },
            ]),
            _ => ResponsesInput::Text(self.message.clone()),
        };

        ResponsesRequest {
            model: self.model.clone(),
            input,
            max_output_tokens: Some(self.max_output_tokens),
        }
    }

    pub async fn send(&self, provider: &dyn Provider) -> Result<ResponseSummary, CompletionError> {
        let result = provider.respond(self.to_request()).await?;
        Ok(ResponseSummary::from(result))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// What gets shown for a one-shot response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    pub id: String,
    pub model: String,
    pub output_text: String,
    /// RFC 3339
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
}

impl From<ResponsesResult> for ResponseSummary {
    fn from(result: ResponsesResult) -> Self {
        Self {
            id: result.id,
            model: result.model,
            output_text: result.output_text,
            created: result
                .created_at
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            usage: result.usage.map(|u| UsageSummary {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.total(),
            }),
        }
    }
}
