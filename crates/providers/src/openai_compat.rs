//! OpenAI-compatible provider implementation.
//!
//! Speaks two endpoints:
//! - `POST {base}/chat/completions` with function-calling tools
//! - `POST {base}/responses` with a string or message-list `input`
//!
//! Requests are never retried; each call carries the full thread.

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use threadloop_core::error::CompletionError;
use threadloop_core::message::{Message, Role, ToolCall, WireMessage};
use threadloop_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Build the chat-completions body. The messages go out exactly as
    /// [`WireMessage`] serializes them.
    fn chat_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }
        body
    }

    /// Rebuild an assistant message from the first choice. Only `function`
    /// tool calls are kept.
    fn to_message(choice: ApiChoice) -> Message {
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|tc| tc.r#type == "function")
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        Message::from_wire(WireMessage {
            role: Role::Assistant,
            content: choice.message.content,
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, CompletionError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CompletionError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(CompletionError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        let body = Self::chat_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self.post("/chat/completions", &body).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("No choices in response".into()))?;

        let message = Self::to_message(choice);

        let usage = api_response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(CompletionResult {
            message,
            usage,
            model: api_response.model,
        })
    }

    async fn respond(&self, request: ResponsesRequest) -> Result<ResponsesResult, CompletionError> {
        let body = serde_json::to_value(&request)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        debug!(provider = %self.name, model = %request.model, "Sending responses request");

        let response = self.post("/responses", &body).await?;

        let api_response: ApiResponsesBody = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let created_at = DateTime::from_timestamp(api_response.created_at, 0).ok_or_else(|| {
            CompletionError::MalformedResponse(format!(
                "created_at out of range: {}",
                api_response.created_at
            ))
        })?;

        let output_text = api_response
            .output_text
            .clone()
            .unwrap_or_else(|| api_response.collect_output_text());

        Ok(ResponsesResult {
            id: api_response.id,
            model: api_response.model,
            output_text,
            created_at,
            usage: api_response.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

// --- OpenAI API types (private) ---

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponsesBody {
    id: String,
    #[serde(default)]
    model: String,
    created_at: i64,
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ApiOutputItem>,
    usage: Option<ApiResponsesUsage>,
}

impl ApiResponsesBody {
    /// Concatenate every `output_text` part of every output item.
    fn collect_output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.r#type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiOutputItem {
    #[serde(default)]
    content: Vec<ApiOutputContent>,
}

#[derive(Debug, Deserialize)]
struct ApiOutputContent {
    r#type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
}
