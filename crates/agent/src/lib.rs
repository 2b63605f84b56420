//! The agentic loop — the heart of threadloop.
//!
//! The controller follows a **call → dispatch → observe** cycle:
//!
//! 1. **Seed** the thread (system preamble + request) or take an existing one
//! 2. **Call the model** with the full thread and every registered tool schema
//! 3. **If tool calls**: run them in emission order, append results, loop to 2
//! 4. **If text**: append the answer and stop
//!
//! The loop also stops when the iteration cap is reached or a completion or
//! tool error ends the run. Every phase is recorded in a [`StepLog`].
//!
//! On top of the controller sit the [`ConversationSession`]s that drive the
//! persisted multi-turn demonstrations, and [`oneshot`] for the stateless one.

pub mod artifact;
pub mod loop_runner;
pub mod oneshot;
pub mod presets;
pub mod session;
pub mod step_log;

pub use artifact::Artifact;
pub use loop_runner::{AgentLoop, RunOutcome, RunStatus, Termination};
pub use oneshot::{OneShotRequest, ResponseSummary};
pub use presets::DemoPreset;
pub use session::{ConversationSession, Exchange, ExchangeError};
pub use step_log::StepLog;
