//! Agent steps — the observable transitions of an agent run.
//!
//! Steps are produced by the agent loop and rendered by whatever view is
//! watching the run. They are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::now_millis;

/// What kind of transition a step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The loop is about to consult the model
    Thinking,
    /// A tool is being invoked
    ToolCall,
    /// A tool finished (or failed)
    ToolResult,
    /// Terminal message: final answer, success note, or error
    Response,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Response => "response",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed transition of the agent loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStep {
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Human-readable summary
    pub content: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<serde_json::Value>,
}

impl AgentStep {
    fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: now_millis(),
            tool_name: None,
            tool_args: None,
            tool_result: None,
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(StepKind::Thinking, content)
    }

    pub fn tool_call(tool_name: impl Into<String>, args: serde_json::Value) -> Self {
        let tool_name = tool_name.into();
        Self {
            tool_args: Some(args),
            ..Self::new(StepKind::ToolCall, format!("Calling {tool_name}"))
        }
        .named(tool_name)
    }

    pub fn tool_result(tool_name: impl Into<String>, result: serde_json::Value) -> Self {
        let tool_name = tool_name.into();
        Self {
            tool_result: Some(result),
            ..Self::new(StepKind::ToolResult, format!("Received result from {tool_name}"))
        }
        .named(tool_name)
    }

    pub fn response(content: impl Into<String>) -> Self {
        Self::new(StepKind::Response, content)
    }

    fn named(mut self, tool_name: String) -> Self {
        self.tool_name = Some(tool_name);
        self
    }
}
