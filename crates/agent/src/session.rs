//! Conversation sessions — the persisted multi-turn demonstrations.
//!
//! A session loads its thread once when it opens and saves the whole thread
//! after every exchange that succeeds. A failed exchange leaves the stored
//! thread untouched: the user's message and an `Error: …` reply are only
//! added to the displayed thread.

use std::sync::Arc;
use threadloop_core::agent::AgentConfig;
use threadloop_core::error::{Error, StoreError};
use threadloop_core::message::{Message, Thread};
use threadloop_core::provider::{Provider, ResponsesRequest, Usage};
use threadloop_core::step::AgentStep;
use threadloop_core::store::{DemoId, ThreadStore};
use threadloop_core::tool::ToolRegistry;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::loop_runner::{AgentLoop, Termination, error_detail};

/// How a session talks to the model.
enum Mode {
    /// Plain chat through the responses "input" mode
    Input { model: String },
    /// Tool calling through the agent loop
    Tools {
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    },
}

/// The result of one successful exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Empty when the loop stopped at its iteration cap
    pub reply: String,
    pub usage: Usage,
    pub termination: Termination,
    /// Model calls made for this exchange
    pub iterations: u32,
    /// Steps recorded by the agent loop; empty in input mode
    pub steps: Vec<AgentStep>,
}

/// A failed exchange, with whatever the loop recorded before failing.
#[derive(Debug)]
pub struct ExchangeError {
    pub error: Error,
    pub steps: Vec<AgentStep>,
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ExchangeError {}

impl From<Error> for ExchangeError {
    fn from(error: Error) -> Self {
        Self {
            error,
            steps: Vec::new(),
        }
    }
}

pub struct ConversationSession {
    key: DemoId,
    provider: Arc<dyn Provider>,
    store: Arc<dyn ThreadStore>,
    mode: Mode,
    /// What was last persisted
    committed: Thread,
    /// What the user sees: `committed` plus any failed exchanges
    display: Thread,
    total_usage: Usage,
    step_sender: Option<UnboundedSender<AgentStep>>,
}

impl ConversationSession {
    /// Multi-turn chat over the responses input mode.
    pub async fn chat(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ThreadStore>,
        model: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::open(DemoId::Section2, provider, store, Mode::Input { model: model.into() }).await
    }

    /// Multi-turn tool calling through the agent loop.
    pub async fn with_tools(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ThreadStore>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self, Error> {
        Self::open(DemoId::Section3, provider, store, Mode::Tools { tools, config }).await
    }

    async fn open(
        key: DemoId,
        provider: Arc<dyn Provider>,
        store: Arc<dyn ThreadStore>,
        mode: Mode,
    ) -> Result<Self, Error> {
        let committed = match store.load(key).await {
            Ok(thread) => thread,
            Err(StoreError::Corrupted { reason, .. }) => {
                warn!(key = %key, reason = %reason, "Stored conversation is corrupted, starting fresh");
                Thread::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!(key = %key, messages = committed.len(), "Opened conversation");

        Ok(Self {
            key,
            provider,
            store,
            mode,
            display: committed.clone(),
            committed,
            total_usage: Usage::default(),
            step_sender: None,
        })
    }

    /// Stream agent steps of every later exchange to `sender`.
    pub fn set_step_sender(&mut self, sender: UnboundedSender<AgentStep>) {
        self.step_sender = Some(sender);
    }

    /// The thread as the user sees it.
    pub fn thread(&self) -> &Thread {
        &self.display
    }

    /// Tokens spent by this session so far.
    pub fn total_usage(&self) -> Usage {
        self.total_usage
    }

    /// Send one user message and wait for the complete reply.
    pub async fn send(&mut self, text: &str) -> Result<Exchange, ExchangeError> {
        let candidate = self.committed.clone().with(Message::user(text));

        let result = match &self.mode {
            Mode::Input { model } => self.respond(model.clone(), candidate.clone()).await,
            Mode::Tools { tools, config } => {
                self.run_tools(tools.clone(), config.clone(), candidate.clone()).await
            }
        };

        match result {
            Ok((thread, exchange)) => {
                self.store
                    .save(self.key, &thread)
                    .await
                    .map_err(|e| ExchangeError::from(Error::from(e)))?;
                self.total_usage += exchange.usage;
                self.display = thread.clone();
                self.committed = thread;
                Ok(exchange)
            }
            Err(failure) => {
                self.display = candidate.with(Message::error(error_detail(&failure.error)));
                Err(failure)
            }
        }
    }

    async fn respond(&self, model: String, thread: Thread) -> Result<(Thread, Exchange), ExchangeError> {
        let request = ResponsesRequest {
            model,
            input: (&thread).into(),
            max_output_tokens: None,
        };
        let response = self
            .provider
            .respond(request)
            .await
            .map_err(|e| ExchangeError::from(Error::from(e)))?;

        let exchange = Exchange {
            reply: response.output_text.clone(),
            usage: response.usage.unwrap_or_default(),
            termination: Termination::Completed,
            iterations: 1,
            steps: Vec::new(),
        };
        Ok((thread.with(Message::assistant(response.output_text)), exchange))
    }

    async fn run_tools(
        &self,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
        thread: Thread,
    ) -> Result<(Thread, Exchange), ExchangeError> {
        let mut agent = AgentLoop::new(self.provider.clone(), tools, config).with_thread(thread);
        if let Some(sender) = &self.step_sender {
            agent = agent.with_step_sender(sender.clone());
        }
        let outcome = agent.run().await;

        if let Some(error) = outcome.error {
            return Err(ExchangeError {
                error,
                steps: outcome.steps,
            });
        }

        let exchange = Exchange {
            reply: outcome.final_text().unwrap_or_default().to_string(),
            usage: outcome.usage,
            termination: outcome.termination,
            iterations: outcome.iterations,
            steps: outcome.steps,
        };
        Ok((outcome.thread, exchange))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use threadloop_core::error::{CompletionError, ToolError};
    use threadloop_core::message::{Role, ToolCall};
    use threadloop_core::provider::{CompletionRequest, CompletionResult, ResponsesResult};
    use threadloop_core::tool::Tool;
    use threadloop_store::InMemoryThreadStore;

    /// Scripted completions for both request shapes.
    #[derive(Default)]
    struct ScriptedProvider {
        completions: Mutex<VecDeque<Result<CompletionResult, CompletionError>>>,
        responses: Mutex<VecDeque<Result<ResponsesResult, CompletionError>>>,
        inputs: Mutex<Vec<ResponsesRequest>>,
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResult, CompletionError> {
            self.completions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::MalformedResponse("script exhausted".into())))
        }

        async fn respond(&self, request: ResponsesRequest) -> Result<ResponsesResult, CompletionError> {
            self.inputs.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::MalformedResponse("script exhausted".into())))
        }
    }

    fn reply(text: &str, input_tokens: u32, output_tokens: u32) -> ResponsesResult {
        ResponsesResult {
            id: "resp_1".into(),
            model: "gpt-5-mini".into(),
            output_text: text.into(),
            created_at: chrono::Utc::now(),
            usage: Some(Usage { input_tokens, output_tokens }),
        }
    }

    struct FlakyPost;

    #[async_trait::async_trait]
    impl Tool for FlakyPost {
        fn name(&self) -> &str {
            "get_reddit_post"
        }
        fn description(&self) -> &str {
            "Fetch a random post from a specified subreddit"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"subreddit": {"type": "string"}}, "required": ["subreddit"]})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            Err(ToolError::Upstream("Failed to fetch Reddit post: no posts found".into()))
        }
    }

    #[tokio::test]
    async fn chat_sends_full_history_and_accumulates_tokens() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.responses.lock().unwrap().extend([
            Ok(reply("Hi Ada!", 10, 4)),
            Ok(reply("Your name is Ada.", 30, 6)),
        ]);
        let store = Arc::new(InMemoryThreadStore::new());

        let mut session = ConversationSession::chat(provider.clone(), store.clone(), "gpt-5-mini")
            .await
            .unwrap();
        session.send("My name is Ada").await.unwrap();
        let second = session.send("What is my name?").await.unwrap();

        assert_eq!(second.reply, "Your name is Ada.");
        assert_eq!(session.total_usage().total(), 50);

        let inputs = provider.inputs.lock().unwrap();
        let serialized = serde_json::to_value(&inputs[1].input).unwrap();
        assert_eq!(serialized.as_array().unwrap().len(), 3);
        assert_eq!(serialized[1]["content"], "Hi Ada!");

        let stored = store.load(DemoId::Section2).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored.last_assistant_text(), Some("Your name is Ada."));
    }

    #[tokio::test]
    async fn failed_exchange_is_not_persisted() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.responses.lock().unwrap().extend([
            Ok(reply("first", 1, 1)),
            Err(CompletionError::RateLimited { retry_after_secs: 5 }),
        ]);
        let store = Arc::new(InMemoryThreadStore::new());

        let mut session = ConversationSession::chat(provider, store.clone(), "m").await.unwrap();
        session.send("one").await.unwrap();
        let err = session.send("two").await.unwrap_err();
        assert!(matches!(err.error, Error::Completion(CompletionError::RateLimited { .. })));

        // Displayed: the failed user turn and the error reply
        let shown = session.thread();
        assert_eq!(shown.len(), 4);
        assert!(shown.last().unwrap().content.starts_with("Error: Rate limited"));

        // Stored: only the successful exchange
        assert_eq!(store.load(DemoId::Section2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn retry_after_failure_does_not_carry_the_error() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.responses.lock().unwrap().extend([
            Err(CompletionError::Network("offline".into())),
            Ok(reply("back online", 1, 1)),
        ]);
        let store = Arc::new(InMemoryThreadStore::new());

        let mut session = ConversationSession::chat(provider, store.clone(), "m").await.unwrap();
        assert!(session.send("hello").await.is_err());
        session.send("hello again").await.unwrap();

        let stored = store.load(DemoId::Section2).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.messages()[0].content, "hello again");
    }

    #[tokio::test]
    async fn session_resumes_stored_thread() {
        let store = Arc::new(InMemoryThreadStore::new());
        store
            .save(
                DemoId::Section2,
                &Thread::new().with(Message::user("earlier")).with(Message::assistant("reply")),
            )
            .await
            .unwrap();

        let session = ConversationSession::chat(Arc::new(ScriptedProvider::default()), store, "m")
            .await
            .unwrap();
        assert_eq!(session.thread().len(), 2);
    }

    #[tokio::test]
    async fn tool_session_persists_whole_exchange() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.completions.lock().unwrap().extend([
            Ok(CompletionResult {
                message: Message::assistant_with_tool_calls(
                    "",
                    vec![ToolCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#)],
                ),
                usage: None,
                model: "m".into(),
            }),
            Ok(CompletionResult {
                message: Message::assistant("22°C in Paris."),
                usage: None,
                model: "m".into(),
            }),
        ]);
        let store = Arc::new(InMemoryThreadStore::new());
        let tools = Arc::new(
            ToolRegistry::new()
                .with(threadloop_tools::WeatherTool::new("demo", 2).with_base_url("http://127.0.0.1:9")),
        );

        let mut session = ConversationSession::with_tools(provider, store.clone(), tools, AgentConfig::new("m"))
            .await
            .unwrap();
        let exchange = session.send("Weather in Paris?").await.unwrap();
        assert_eq!(exchange.reply, "22°C in Paris.");
        assert!(!exchange.steps.is_empty());

        let stored = store.load(DemoId::Section3).await.unwrap();
        let roles: Vec<Role> = stored.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert!(stored.validate().is_ok());
    }

    #[tokio::test]
    async fn capped_tool_exchange_has_no_stale_reply() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.completions.lock().unwrap().push_back(Ok(CompletionResult {
            message: Message::assistant("It's sunny."),
            usage: None,
            model: "m".into(),
        }));
        provider.completions.lock().unwrap().extend((0..2).map(|i| {
            Ok(CompletionResult {
                message: Message::assistant_with_tool_calls(
                    "",
                    vec![ToolCall::new(format!("call_{i}"), "get_weather", r#"{"city":"Paris"}"#)],
                ),
                usage: None,
                model: "m".into(),
            })
        }));
        let store = Arc::new(InMemoryThreadStore::new());
        let tools = Arc::new(
            ToolRegistry::new()
                .with(threadloop_tools::WeatherTool::new("demo", 2).with_base_url("http://127.0.0.1:9")),
        );
        let config = AgentConfig::new("m").with_max_iterations(2);

        let mut session = ConversationSession::with_tools(provider, store.clone(), tools, config)
            .await
            .unwrap();
        let first = session.send("Weather?").await.unwrap();
        assert_eq!(first.termination, Termination::Completed);
        assert_eq!(first.reply, "It's sunny.");

        let capped = session.send("And tomorrow?").await.unwrap();
        assert_eq!(capped.termination, Termination::IterationCapReached);
        assert_eq!(capped.iterations, 2);
        assert_eq!(capped.reply, "");

        let stored = store.load(DemoId::Section3).await.unwrap();
        assert!(stored.validate().is_ok());
        assert_eq!(stored.last().unwrap().role, Role::Tool);
    }

    #[tokio::test]
    async fn tool_failure_is_displayed_not_stored() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.completions.lock().unwrap().push_back(Ok(CompletionResult {
            message: Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("call_1", "get_reddit_post", r#"{"subreddit":"empty"}"#)],
            ),
            usage: None,
            model: "m".into(),
        }));
        let store = Arc::new(InMemoryThreadStore::new());
        let tools = Arc::new(ToolRegistry::new().with(FlakyPost));

        let mut session = ConversationSession::with_tools(provider, store.clone(), tools, AgentConfig::new("m"))
            .await
            .unwrap();
        let err = session.send("Show me r/empty").await.unwrap_err();
        assert!(err.steps.last().unwrap().content.starts_with("Error: "));

        assert!(session.thread().last().unwrap().content.contains("no posts found"));
        assert!(store.load(DemoId::Section3).await.unwrap().is_empty());
    }
}
