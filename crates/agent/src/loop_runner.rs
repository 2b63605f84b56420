//! The agent reasoning loop implementation.

use std::sync::Arc;
use threadloop_core::agent::AgentConfig;
use threadloop_core::error::{Error, ToolError};
use threadloop_core::message::{Message, Thread, ToolCall};
use threadloop_core::provider::{CompletionRequest, CompletionResult, Provider, ToolDefinition, Usage};
use threadloop_core::step::AgentStep;
use threadloop_core::tool::ToolRegistry;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::artifact::Artifact;
use crate::presets::DemoPreset;
use crate::step_log::StepLog;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Done,
    Failed,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model answered with text and asked for nothing else
    Completed,
    /// The iteration cap was reached first; the result is partial
    IterationCapReached,
    /// A completion or tool error stopped the run
    Failed,
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub termination: Termination,
    pub thread: Thread,
    pub steps: Vec<AgentStep>,
    pub artifact: Artifact,
    /// Number of model consultations
    pub iterations: u32,
    pub tool_calls_made: usize,
    pub usage: Usage,
    /// The error that failed the run, if any
    pub error: Option<Error>,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }

    /// The model's final answer; `None` unless the run completed.
    pub fn final_text(&self) -> Option<&str> {
        match self.termination {
            Termination::Completed => self.thread.last_assistant_text(),
            Termination::IterationCapReached | Termination::Failed => None,
        }
    }
}

enum LoopState {
    CallingModel,
    DispatchingTools(Vec<ToolCall>),
    Done(Termination),
    Failed(Error),
}

/// The controller that alternates completion calls with tool dispatch.
///
/// A loop runs once: [`AgentLoop::run`] consumes it.
pub struct AgentLoop {
    /// The completion client
    provider: Arc<dyn Provider>,

    /// Tools offered to the model on every call
    tools: Arc<ToolRegistry>,

    /// Model and iteration cap
    config: AgentConfig,

    thread: Thread,
    log: StepLog,
    artifact: Artifact,

    /// Recorded before the first model call
    opening_step: Option<String>,

    required_slots: Vec<String>,
    success_message: Option<String>,

    iterations: u32,
    tool_calls_made: usize,
    usage: Usage,
}

impl AgentLoop {
    /// Create a new agent loop over an empty thread.
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
            thread: Thread::new(),
            log: StepLog::new(),
            artifact: Artifact::new(),
            opening_step: None,
            required_slots: Vec::new(),
            success_message: None,
            iterations: 0,
            tool_calls_made: 0,
            usage: Usage::default(),
        }
    }

    /// An autonomous run: the thread is seeded from the preset.
    pub fn from_preset(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
        preset: &DemoPreset,
    ) -> Self {
        let mut agent = Self::new(provider, tools, config).with_thread(preset.seed_thread());
        agent.opening_step = preset.opening_step.clone();
        agent.required_slots = preset.required_slots.clone();
        agent.success_message = preset.success_message.clone();
        agent
    }

    /// Continue an existing thread (interactive runs).
    pub fn with_thread(mut self, thread: Thread) -> Self {
        self.thread = thread;
        self
    }

    /// Forward every step to `sender` as it is recorded.
    pub fn with_step_sender(mut self, sender: UnboundedSender<AgentStep>) -> Self {
        let recorded = std::mem::take(&mut self.log).into_steps();
        self.log = StepLog::with_sender(sender);
        for step in recorded {
            self.log.record(step);
        }
        self
    }

    /// Drive the loop to a terminal state.
    ///
    /// Never returns an error: failures end the run `Failed` and are reported
    /// in the outcome.
    pub async fn run(mut self) -> RunOutcome {
        info!(
            model = %self.config.model,
            messages = self.thread.len(),
            tools = self.tools.len(),
            max_iterations = self.config.max_iterations,
            "Starting agent run"
        );

        if let Some(opening) = self.opening_step.take() {
            self.log.record(AgentStep::thinking(opening));
        }

        let definitions = self.tools.definitions();
        let mut state = LoopState::CallingModel;

        loop {
            state = match state {
                LoopState::CallingModel => self.call_model(&definitions).await,
                LoopState::DispatchingTools(calls) => match self.dispatch(&calls).await {
                    Ok(()) => LoopState::CallingModel,
                    Err(e) => LoopState::Failed(e.into()),
                },
                LoopState::Done(termination) => return self.finish(termination),
                LoopState::Failed(error) => return self.fail(error),
            };
        }
    }

    async fn call_model(&mut self, definitions: &[ToolDefinition]) -> LoopState {
        if self.iterations >= self.config.max_iterations {
            warn!(
                iterations = self.iterations,
                "Max iterations reached, ending run with partial result"
            );
            return LoopState::Done(Termination::IterationCapReached);
        }

        self.iterations += 1;
        debug!(iteration = self.iterations, "Agent loop iteration");
        self.log.record(AgentStep::thinking(format!(
            "Iteration {}: Calling the model...",
            self.iterations
        )));

        let request =
            CompletionRequest::new(&self.config.model, &self.thread).with_tools(definitions.to_vec());

        match self.provider.complete(request).await {
            Ok(result) => self.absorb(result),
            Err(e) => {
                warn!(error = %e, "Completion failed");
                LoopState::Failed(e.into())
            }
        }
    }

    /// Fold one completion into the thread and pick the next state.
    fn absorb(&mut self, result: CompletionResult) -> LoopState {
        if let Some(usage) = result.usage {
            self.usage += usage;
        }

        if result.message.has_tool_calls() {
            debug!(tool_count = result.tool_calls().len(), "Model requested tools");
            let calls = result.message.tool_calls.clone();
            self.thread.append(result.message);
            return LoopState::DispatchingTools(calls);
        }

        if !result.message.content.is_empty() {
            self.log.record(AgentStep::response(&result.message.content));
            self.thread.append(result.message);
            return LoopState::Done(Termination::Completed);
        }

        debug!("Model returned neither text nor tool calls, asking again");
        self.thread.append(Message::assistant(""));
        LoopState::CallingModel
    }

    /// Run one turn's tool calls strictly in emission order.
    ///
    /// An unparsable argument payload only fails its own call: the error is
    /// fed back to the model as that call's result. Any other tool error
    /// fails the run.
    async fn dispatch(&mut self, calls: &[ToolCall]) -> Result<(), ToolError> {
        for call in calls {
            let name = call.name();

            let arguments = match call.parse_arguments() {
                Ok(arguments) => arguments,
                Err(e) => {
                    warn!(tool = %name, error = %e, "Tool arguments are not valid JSON");
                    self.log.record(AgentStep::tool_call(
                        name,
                        serde_json::Value::String(call.function.arguments.clone()),
                    ));
                    let payload = serde_json::json!({ "error": e.to_string() });
                    self.log.record(AgentStep::tool_result(name, payload.clone()));
                    self.thread
                        .append(Message::tool_result(&call.id, name, payload.to_string()));
                    continue;
                }
            };

            self.log.record(AgentStep::tool_call(name, arguments.clone()));

            let result = self.tools.invoke(name, arguments).await.inspect_err(|e| {
                warn!(tool = %name, error = %e, "Tool execution failed");
            })?;
            self.tool_calls_made += 1;

            for slot in self.tools.artifact_slots(name, &result) {
                self.artifact.fill(slot);
            }
            self.log.record(AgentStep::tool_result(name, result.clone()));
            self.thread
                .append(Message::tool_result(&call.id, name, result.to_string()));
        }
        Ok(())
    }

    fn finish(mut self, termination: Termination) -> RunOutcome {
        if !self.artifact.is_empty() && self.artifact.has_all(&self.required_slots) {
            if let Some(message) = self.success_message.take() {
                self.log.record(AgentStep::response(message));
            }
        }

        info!(
            iterations = self.iterations,
            tool_calls = self.tool_calls_made,
            tokens = self.usage.total(),
            ?termination,
            "Agent run finished"
        );

        self.into_outcome(RunStatus::Done, termination, None)
    }

    fn fail(mut self, error: Error) -> RunOutcome {
        self.log.record(AgentStep::response(format!("Error: {}", error_detail(&error))));
        warn!(iterations = self.iterations, error = %error, "Agent run failed");
        self.into_outcome(RunStatus::Failed, Termination::Failed, Some(error))
    }

    fn into_outcome(self, status: RunStatus, termination: Termination, error: Option<Error>) -> RunOutcome {
        RunOutcome {
            status,
            termination,
            thread: self.thread,
            steps: self.log.into_steps(),
            artifact: self.artifact,
            iterations: self.iterations,
            tool_calls_made: self.tool_calls_made,
            usage: self.usage,
            error,
        }
    }
}

/// The inner error's message, without the aggregate's "Completion error:"
/// style prefix.
pub(crate) fn error_detail(error: &Error) -> String {
    match error {
        Error::Completion(e) => e.to_string(),
        Error::Tool(e) => e.to_string(),
        other => other.to_string(),
    }
}
