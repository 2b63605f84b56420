//! Message and Thread domain types.
//!
//! These are the core value objects that flow through the entire system:
//! user input becomes a `Message`, messages accumulate in a `Thread`, the
//! thread is projected to the endpoint's wire format for every completion
//! call, and the endpoint's reply comes back through the same wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ThreadError, ToolError};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// Instructions that frame the conversation
    System,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current time truncated to millisecond precision, the precision persisted
/// records carry.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content (empty for assistant turns that only carry tool calls)
    #[serde(default)]
    pub content: String,

    /// Creation instant; informational only, insertion order is authoritative
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now_millis")]
    pub timestamp: DateTime<Utc>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool name, on tool results only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_millis(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create an assistant message that requests tool execution.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Synthetic assistant message surfacing a failed exchange to the user.
    pub fn error(description: impl std::fmt::Display) -> Self {
        Self::assistant(format!("Error: {description}"))
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Project this message onto the completion endpoint's wire shape.
    pub fn to_wire(&self) -> WireMessage {
        match self.role {
            Role::Assistant if self.has_tool_calls() => WireMessage {
                role: Role::Assistant,
                content: (!self.content.is_empty()).then(|| self.content.clone()),
                tool_calls: Some(self.tool_calls.clone()),
                tool_call_id: None,
            },
            Role::Tool => WireMessage {
                role: Role::Tool,
                content: Some(self.content.clone()),
                tool_calls: None,
                tool_call_id: self.tool_call_id.clone(),
            },
            role => WireMessage {
                role,
                content: Some(self.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
        }
    }

    /// Rebuild a message from its wire shape. Inverse of [`Message::to_wire`]
    /// up to the informational `timestamp` and `name` fields.
    pub fn from_wire(wire: WireMessage) -> Self {
        Self {
            tool_calls: wire.tool_calls.unwrap_or_default(),
            tool_call_id: wire.tool_call_id,
            ..Self::new(wire.role, wire.content.unwrap_or_default())
        }
    }
}

/// Discriminator of a tool call on the wire. The endpoint only issues
/// function calls to us.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallKind {
    #[default]
    Function,
}

/// A single requested invocation, embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique within the emitting assistant message (matches the LLM's tool_call.id)
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: ToolCallKind,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a serialized JSON object
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ToolCallKind::Function,
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Parse the argument payload. An empty payload means "no arguments".
    pub fn parse_arguments(&self) -> Result<serde_json::Value, ToolError> {
        let raw = self.function.arguments.trim();
        if raw.is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(raw).map_err(|e| ToolError::ArgumentParse {
            tool_name: self.function.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// A message in the shape the chat-completions endpoint expects.
///
/// `content` is always serialized, as `null` for assistant turns that only
/// carry tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,

    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// An ordered, append-only conversation history.
///
/// Serialized as a plain JSON array of messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thread {
    messages: Vec<Message>,
}

impl Thread {
    /// Create a new empty thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing message sequence (e.g. one loaded from storage).
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message. Prior entries are never touched.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Builder-style append.
    pub fn with(mut self, message: Message) -> Self {
        self.append(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Content of the most recent assistant message, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Order-preserving projection to the chat-completions wire format:
    /// the n-th wire entry is the n-th message.
    pub fn to_wire_format(&self) -> Vec<WireMessage> {
        self.messages.iter().map(Message::to_wire).collect()
    }

    /// Projection for the responses "input" mode, which has no tool role:
    /// tool results are replayed as assistant text and tool-call lists are
    /// dropped.
    pub fn to_input_messages(&self) -> Vec<crate::provider::InputMessage> {
        self.messages
            .iter()
            .map(|m| crate::provider::InputMessage {
                role: match m.role {
                    Role::Tool => Role::Assistant,
                    role => role,
                },
                content: m.content.clone(),
            })
            .collect()
    }

    /// Check tool-call / tool-result referential integrity: every tool
    /// message must answer a call emitted earlier and not yet answered.
    pub fn validate(&self) -> Result<(), ThreadError> {
        let mut unanswered: HashSet<&str> = HashSet::new();

        for (index, message) in self.messages.iter().enumerate() {
            match message.role {
                Role::Assistant => {
                    let mut emitted = HashSet::new();
                    for call in &message.tool_calls {
                        if !emitted.insert(call.id.as_str()) {
                            return Err(ThreadError::DuplicateToolCallId {
                                index,
                                tool_call_id: call.id.clone(),
                            });
                        }
                        unanswered.insert(call.id.as_str());
                    }
                }
                Role::Tool => {
                    let id = message
                        .tool_call_id
                        .as_deref()
                        .ok_or(ThreadError::MissingToolCallId { index })?;
                    if !unanswered.remove(id) {
                        return Err(ThreadError::OrphanToolResult {
                            index,
                            tool_call_id: id.to_string(),
                        });
                    }
                }
                Role::User | Role::System => {}
            }
        }

        Ok(())
    }
}

impl From<Vec<Message>> for Thread {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}

impl<'a> IntoIterator for &'a Thread {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_exchange() -> Thread {
        Thread::new()
            .with(Message::user("Weather in Paris and Rome?"))
            .with(Message::assistant_with_tool_calls(
                "",
                vec![
                    ToolCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#),
                    ToolCall::new("call_2", "get_weather", r#"{"city":"Rome"}"#),
                ],
            ))
            .with(Message::tool_result("call_1", "get_weather", r#"{"temperature":22}"#))
            .with(Message::tool_result("call_2", "get_weather", r#"{"temperature":25}"#))
            .with(Message::assistant("Paris is 22°C, Rome is 25°C."))
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn error_message_is_marked() {
        let msg = Message::error("connection refused");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Error: connection refused");
    }

    #[test]
    fn wire_format_preserves_order() {
        let thread = weather_exchange();
        let wire = thread.to_wire_format();
        assert_eq!(wire.len(), thread.len());
        for (message, entry) in thread.iter().zip(&wire) {
            assert_eq!(message.role, entry.role);
        }
        assert_eq!(wire[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn wire_assistant_with_tool_calls_has_null_content() {
        let thread = weather_exchange();
        let wire = thread.to_wire_format();
        assert!(wire[1].content.is_none());
        assert_eq!(wire[1].tool_calls.as_ref().map(Vec::len), Some(2));

        let json = serde_json::to_value(&wire[1]).unwrap();
        assert!(json["content"].is_null());
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "get_weather");
    }

    #[test]
    fn wire_plain_messages_omit_tool_fields() {
        let json = serde_json::to_value(Message::user("hi").to_wire()).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn wire_projection_is_reversible() {
        let thread = weather_exchange();
        let rebuilt: Vec<Message> = thread
            .to_wire_format()
            .into_iter()
            .map(Message::from_wire)
            .collect();

        for (original, back) in thread.iter().zip(&rebuilt) {
            assert_eq!(original.role, back.role);
            assert_eq!(original.content, back.content);
            assert_eq!(original.tool_calls, back.tool_calls);
            assert_eq!(original.tool_call_id, back.tool_call_id);
        }
    }

    #[test]
    fn input_messages_map_tool_role_to_assistant() {
        let input = weather_exchange().to_input_messages();
        assert_eq!(input.len(), 5);
        assert_eq!(input[2].role, Role::Assistant);
        assert_eq!(input[2].content, r#"{"temperature":22}"#);
    }

    #[test]
    fn validate_accepts_linked_thread() {
        assert!(weather_exchange().validate().is_ok());
    }

    #[test]
    fn validate_rejects_orphan_tool_result() {
        let thread = Thread::new()
            .with(Message::user("hi"))
            .with(Message::tool_result("call_x", "get_weather", "{}"));
        assert_eq!(
            thread.validate(),
            Err(ThreadError::OrphanToolResult {
                index: 1,
                tool_call_id: "call_x".into()
            })
        );
    }

    #[test]
    fn validate_rejects_double_answer() {
        let thread = Thread::new()
            .with(Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("call_1", "get_weather", "{}")],
            ))
            .with(Message::tool_result("call_1", "get_weather", "{}"))
            .with(Message::tool_result("call_1", "get_weather", "{}"));
        assert!(matches!(
            thread.validate(),
            Err(ThreadError::OrphanToolResult { index: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_call_ids() {
        let thread = Thread::new().with(Message::assistant_with_tool_calls(
            "",
            vec![
                ToolCall::new("call_1", "a", "{}"),
                ToolCall::new("call_1", "b", "{}"),
            ],
        ));
        assert!(matches!(
            thread.validate(),
            Err(ThreadError::DuplicateToolCallId { index: 0, .. })
        ));
    }

    #[test]
    fn serialization_uses_camel_case_and_millis() {
        let msg = Message::tool_result("call_1", "get_weather", "{}");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["toolCallId"], "call_1");
        assert_eq!(json["name"], "get_weather");
        assert!(json["timestamp"].is_i64());
        assert!(json.get("toolCalls").is_none());
    }

    #[test]
    fn thread_serialization_roundtrip() {
        let thread = weather_exchange();
        let json = serde_json::to_string(&thread).unwrap();
        assert!(json.starts_with('['));
        let back: Thread = serde_json::from_str(&json).unwrap();
        assert_eq!(back, thread);
    }

    #[test]
    fn legacy_record_without_timestamp_loads() {
        let back: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(back.role, Role::User);
        assert_eq!(back.content, "hi");
    }

    #[test]
    fn empty_arguments_parse_as_empty_object() {
        let call = ToolCall::new("call_1", "get_reddit_joke", "");
        assert_eq!(call.parse_arguments().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn malformed_arguments_are_a_parse_error() {
        let call = ToolCall::new("call_1", "get_weather", "{city: Paris");
        let err = call.parse_arguments().unwrap_err();
        assert!(matches!(err, ToolError::ArgumentParse { ref tool_name, .. } if tool_name == "get_weather"));
    }

    #[test]
    fn last_assistant_text_skips_tool_messages() {
        let thread = weather_exchange();
        assert_eq!(thread.last_assistant_text(), Some("Paris is 22°C, Rome is 25°C."));
        assert_eq!(Thread::new().last_assistant_text(), None);
    }
}
