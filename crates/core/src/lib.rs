//! # threadloop core
//!
//! Domain types, traits, and error definitions shared by every threadloop crate.
//! Nothing in here talks to the network or the filesystem; it defines the
//! conversation model that the provider, store, tool, and agent crates
//! implement against.
//!
//! ## Layout
//!
//! - [`message`] — `Message`, `ToolCall`, and the append-only `Thread`
//!   together with its wire-format projection
//! - [`tool`] — the `Tool` trait and the `ToolRegistry`
//! - [`provider`] — the `Provider` trait (completion client boundary)
//! - [`step`] — `AgentStep`, the observable unit of an agent run
//! - [`store`] — the `ThreadStore` trait for persisted conversations
//! - [`error`] — one error enum per bounded context

pub mod agent;
pub mod error;
pub mod message;
pub mod provider;
pub mod step;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::AgentConfig;
pub use error::{CompletionError, Error, Result, StoreError, ThreadError, ToolError};
pub use message::{FunctionCall, Message, Role, Thread, ToolCall, WireMessage};
pub use provider::{
    CompletionRequest, CompletionResult, InputMessage, Provider, ResponsesInput,
    ResponsesRequest, ResponsesResult, ToolDefinition, Usage,
};
pub use step::{AgentStep, StepKind};
pub use store::{DemoId, ThreadStore};
pub use tool::{ArtifactSlot, Tool, ToolRegistry};
