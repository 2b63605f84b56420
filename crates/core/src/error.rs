//! Error types for the threadloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use thiserror::Error;

/// The top-level error type for all threadloop operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion endpoint errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Thread structure errors ---
    #[error("Thread error: {0}")]
    Thread(#[from] ThreadError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The remote completion call failed. Never retried by the adapter.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A registered tool failed; `cause` is the tool's own error.
    #[error("Tool execution failed: {tool_name}: {cause}")]
    Execution { tool_name: String, cause: String },

    /// The tool call's argument payload is not valid JSON.
    #[error("Invalid arguments for {tool_name}: {reason}")]
    ArgumentParse { tool_name: String, reason: String },

    /// Raised by a tool when its (parsed) arguments have the wrong shape.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// Raised by a tool when its upstream service failed.
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stored conversation '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Violations of the tool-call / tool-result linkage inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("Tool message at index {index} has no tool_call_id")]
    MissingToolCallId { index: usize },

    #[error("Tool message at index {index} answers unknown or already answered call '{tool_call_id}'")]
    OrphanToolResult { index: usize, tool_call_id: String },

    #[error("Assistant message at index {index} emits duplicate tool call id '{tool_call_id}'")]
    DuplicateToolCallId { index: usize, tool_call_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_execution_error_names_the_tool() {
        let err = Error::Tool(ToolError::Execution {
            tool_name: "get_reddit_post".into(),
            cause: "No posts found".into(),
        });
        assert!(err.to_string().contains("get_reddit_post"));
        assert!(err.to_string().contains("No posts found"));
    }

    #[test]
    fn thread_error_reports_index() {
        let err = ThreadError::OrphanToolResult {
            index: 3,
            tool_call_id: "call_9".into(),
        };
        assert!(err.to_string().contains("index 3"));
        assert!(err.to_string().contains("call_9"));
    }
}
