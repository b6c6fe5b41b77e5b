//! ReAct loop controller — Thought → Action → Observation until a final
//! answer or the iteration cap.
//!
//! Each pass invokes the model with the whole conversation, parses the
//! reply and either delivers the answer or runs one tool and appends the
//! exchange as a single AI turn:
//!
//! ```text
//! <raw model reply>
//!
//! Observation: <tool output>
//! ```
//!
//! Every tool call counts as one iteration, whether or not it succeeded.
//! Reaching `max_iterations` without an answer ends the run as
//! [`ReactOutcome::Exhausted`] and emits an `error` event.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use textloop_config::AppConfig;
use textloop_core::error::Error;
use textloop_core::message::{Conversation, Turn};
use textloop_core::provider::{Provider, ProviderRequest};
use textloop_core::tool::ToolRegistry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::executor::ActionExecutor;
use crate::parser::{ReactStep, ResponseParser};
use crate::prompt::PromptCache;
use crate::stream_event::{AgentEvent, AgentStep};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactOutcome {
    /// The model produced an answer. `implicit` is set when the reply
    /// carried no protocol markers and was delivered verbatim.
    Answered {
        answer: String,
        iterations: u32,
        implicit: bool,
    },

    /// The iteration cap was reached first.
    Exhausted { iterations: u32 },
}

impl ReactOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn iterations(&self) -> u32 {
        match self {
            Self::Answered { iterations, .. } | Self::Exhausted { iterations } => *iterations,
        }
    }
}

/// A spawned run: its events and a handle yielding the updated
/// conversation once the loop is done.
pub struct StreamRun {
    pub events: mpsc::Receiver<AgentEvent>,
    pub handle: JoinHandle<(Conversation, Result<ReactOutcome, Error>)>,
}

pub struct ReactAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    stop: Vec<String>,
    executor: ActionExecutor,
    parser: ResponseParser,
    prompts: PromptCache,
    max_iterations: u32,
    max_history_turns: usize,
    chunk_words: usize,
    chunk_delay: Duration,
    result_preview_chars: usize,
    fixed_date: Option<NaiveDate>,
}

impl ReactAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            stop: Vec::new(),
            executor: ActionExecutor::new(tools),
            parser: ResponseParser::new(),
            prompts: PromptCache::new(),
            max_iterations: 10,
            max_history_turns: textloop_core::message::DEFAULT_MAX_TURNS,
            chunk_words: 10,
            chunk_delay: Duration::ZERO,
            result_preview_chars: 2000,
            fixed_date: None,
        }
    }

    /// Build an agent with every setting taken from `config`.
    ///
    /// The configuration is validated first, so settings built in code get
    /// the same checks as a config file.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &AppConfig,
    ) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        let agent = &config.agent;
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Ok(Self::new(provider, model, tools)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(agent.max_iterations)
            .with_tool_timeout(Duration::from_secs(agent.tool_timeout_secs))
            .with_max_history_turns(agent.max_history_turns)
            .with_chunking(
                agent.stream_chunk_words,
                Duration::from_millis(agent.stream_chunk_delay_ms),
            )
            .with_result_preview_chars(agent.result_preview_chars)
            .with_balanced_braces(agent.balanced_braces)
            .with_stop_sequences(agent.stop_sequences.clone()))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    pub fn with_max_history_turns(mut self, max: usize) -> Self {
        self.max_history_turns = max;
        self
    }

    /// Words per `stream-chunk` event and the pause between chunks.
    pub fn with_chunking(mut self, words: usize, delay: Duration) -> Self {
        self.chunk_words = words.max(1);
        self.chunk_delay = delay;
        self
    }

    pub fn with_result_preview_chars(mut self, chars: usize) -> Self {
        self.result_preview_chars = chars;
        self
    }

    pub fn with_balanced_braces(mut self, enabled: bool) -> Self {
        self.parser = self.parser.with_balanced_braces(enabled);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Pin the date shown in the system prompt.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        self.executor.tools()
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// An empty conversation with this agent's history cap.
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_max_turns(self.max_history_turns)
    }

    /// The system prompt as it would be sent right now.
    pub fn system_prompt(&self) -> Arc<str> {
        self.prompts.get(self.executor.tools(), self.today())
    }

    fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn request(&self, conversation: &Conversation) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            turns: conversation.turns().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
        }
    }

    /// Run the loop for one user message.
    ///
    /// Events go to `events`; a closed receiver is ignored, but a live one
    /// must be drained or the loop stalls once the channel is full. Model
    /// failures end the run with `Err`; tool failures never do.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<ReactOutcome, Error> {
        let system_prompt = self.system_prompt();
        if conversation.ensure_system(&*system_prompt) {
            debug!(session_id = %conversation.id, "System prompt added");
        }
        conversation.push(Turn::human(user_message));

        info!(
            session_id = %conversation.id,
            model = %self.model,
            max_iterations = self.max_iterations,
            "ReAct loop starting"
        );

        let mut iteration = 0u32;
        loop {
            if iteration >= self.max_iterations {
                warn!(
                    session_id = %conversation.id,
                    iterations = iteration,
                    "Max iterations reached without a final answer"
                );
                emit(
                    events,
                    AgentEvent::Error {
                        content: format!(
                            "Stopped after {} tool calls without reaching a final answer.",
                            self.max_iterations
                        ),
                    },
                )
                .await;
                return Ok(ReactOutcome::Exhausted {
                    iterations: iteration,
                });
            }

            emit(
                events,
                AgentEvent::AgentStep {
                    step: AgentStep::Thinking,
                    content: "Thinking...".into(),
                },
            )
            .await;

            let started = Instant::now();
            let response = self.provider.invoke(self.request(conversation)).await?;
            debug!(
                session_id = %conversation.id,
                iteration,
                duration_ms = started.elapsed().as_millis() as u64,
                chars = response.text.len(),
                "Model replied"
            );

            let (answer, implicit) = match self.parser.parse(&response.text) {
                ReactStep::FinalAnswer { text } => (text, false),
                ReactStep::Unrecognized { raw } => {
                    debug!(session_id = %conversation.id, iteration, "Reply has no protocol markers");
                    (raw, true)
                }
                ReactStep::ToolAction {
                    thought,
                    tool_name,
                    args,
                } => {
                    let tool_id = Uuid::new_v4().to_string();
                    emit(
                        events,
                        AgentEvent::AgentStep {
                            step: AgentStep::Executing,
                            content: if thought.is_empty() {
                                format!("Using {tool_name}")
                            } else {
                                thought
                            },
                        },
                    )
                    .await;
                    emit(
                        events,
                        AgentEvent::ToolCall {
                            tool_name: tool_name.clone(),
                            tool_args: serde_json::Value::Object(args.clone()),
                            tool_id: tool_id.clone(),
                        },
                    )
                    .await;

                    let observation = self.executor.execute(&tool_name, args).await;
                    info!(
                        session_id = %conversation.id,
                        iteration,
                        tool = %tool_name,
                        duration_ms = observation.duration_ms,
                        is_error = observation.is_error,
                        "Tool executed"
                    );
                    conversation.push(Turn::ai_with_observation(&response.text, &observation.text));

                    let event = if observation.is_error {
                        AgentEvent::ToolError {
                            tool_name,
                            error: observation.text,
                            tool_id,
                        }
                    } else {
                        AgentEvent::ToolResult {
                            tool_name,
                            result: preview(&observation.text, self.result_preview_chars),
                            tool_id,
                        }
                    };
                    emit(events, event).await;

                    iteration += 1;
                    continue;
                }
            };

            conversation.push(Turn::ai(response.text));
            self.stream_answer(&answer, events).await;
            info!(session_id = %conversation.id, iterations = iteration, implicit, "ReAct loop finished");
            return Ok(ReactOutcome::Answered {
                answer,
                iterations: iteration,
                implicit,
            });
        }
    }

    /// Spawn the loop on its own task and hand back its event stream.
    ///
    /// A model failure is reported as a final `error` event as well as in
    /// the join result.
    pub fn run_stream(
        self: &Arc<Self>,
        conversation: Conversation,
        user_message: impl Into<String>,
    ) -> StreamRun {
        let (tx, rx) = mpsc::channel::<AgentEvent>(128);
        let agent = Arc::clone(self);
        let user_message = user_message.into();

        let handle = tokio::spawn(async move {
            let mut conversation = conversation;
            let result = agent.run(&mut conversation, &user_message, &tx).await;
            if let Err(e) = &result {
                warn!(session_id = %conversation.id, error = %e, "ReAct loop failed");
                emit(&tx, AgentEvent::Error { content: e.to_string() }).await;
            }
            (conversation, result)
        });

        StreamRun {
            events: rx,
            handle,
        }
    }

    async fn stream_answer(&self, answer: &str, events: &mpsc::Sender<AgentEvent>) {
        emit(events, AgentEvent::StreamStart).await;
        for (i, chunk) in word_chunks(answer, self.chunk_words).into_iter().enumerate() {
            if i > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            emit(
                events,
                AgentEvent::StreamChunk {
                    content: chunk.to_string(),
                },
            )
            .await;
        }
        emit(events, AgentEvent::StreamEnd).await;
    }
}

async fn emit(events: &mpsc::Sender<AgentEvent>, event: AgentEvent) {
    // A dropped receiver just means nobody is listening.
    let _ = events.send(event).await;
}

/// Split `text` into runs of `words` words. Whitespace stays attached to
/// the preceding word, so the chunks concatenate back to `text`.
fn word_chunks(text: &str, words: usize) -> Vec<&str> {
    let words = words.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    let mut prev_is_space = true;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if prev_is_space && !is_space {
            if count == words {
                chunks.push(&text[start..i]);
                start = i;
                count = 0;
            }
            count += 1;
        }
        prev_is_space = is_space;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// At most `max_chars` characters, with `...` appended when cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use textloop_core::error::ProviderError;
    use textloop_core::message::Role;
    use textloop_tools::CalculatorTool;

    fn tools() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new()
            .with(Arc::new(CalculatorTool))
            .and_then(|r| r.with(Arc::new(BigOutputTool { size: 5000 })))
            .and_then(|r| r.with(Arc::new(HangingTool)))
            .unwrap();
        Arc::new(registry)
    }

    fn agent(provider: Arc<ScriptedProvider>) -> ReactAgent {
        ReactAgent::new(provider, "mock-model", tools())
            .with_date(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
    }

    async fn run(
        agent: &ReactAgent,
        conversation: &mut Conversation,
        message: &str,
    ) -> (Result<ReactOutcome, Error>, Vec<AgentEvent>) {
        let (tx, mut rx) = mpsc::channel(1024);
        let result = agent.run(conversation, message, &tx).await;
        drop(tx);
        (result, drain(&mut rx))
    }

    fn streamed_text(events: &[AgentEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::StreamChunk { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn direct_final_answer() {
        let provider = Arc::new(ScriptedProvider::texts([final_answer("Hello!")]));
        let agent = agent(provider.clone());
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "Hi").await;

        assert_eq!(
            result.unwrap(),
            ReactOutcome::Answered {
                answer: "Hello!".into(),
                iterations: 0,
                implicit: false
            }
        );
        assert_eq!(provider.call_count(), 1);

        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, ["agent-step", "stream-start", "stream-chunk", "stream-end"]);

        let roles: Vec<_> = conv.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::System, Role::Human, Role::Ai]);
        assert_eq!(conv.turns()[2].content, final_answer("Hello!"));
    }

    #[tokio::test]
    async fn tool_then_answer() {
        let provider = Arc::new(ScriptedProvider::texts([
            action("calculator", r#"{"expression": "2 + 2"}"#),
            final_answer("2 + 2 is 4."),
        ]));
        let agent = agent(provider.clone());
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "What is 2+2?").await;
        let outcome = result.unwrap();
        assert_eq!(outcome.answer(), Some("2 + 2 is 4."));
        assert_eq!(outcome.iterations(), 1);

        let call = events
            .iter()
            .find_map(|e| match e {
                AgentEvent::ToolCall {
                    tool_name,
                    tool_args,
                    tool_id,
                } => Some((tool_name.clone(), tool_args.clone(), tool_id.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(call.0, "calculator");
        assert_eq!(call.1, serde_json::json!({"expression": "2 + 2"}));

        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::ToolResult { result, tool_id, .. } if result == "4" && *tool_id == call.2
        )));

        // system, human, action+observation, final
        assert_eq!(conv.len(), 4);
        assert!(conv.turns()[2].content.ends_with("\n\nObservation: 4\n\n"));

        let second = &provider.requests()[1];
        assert_eq!(second.turns.len(), 3);
        assert!(second.turns[2].content.contains("Observation: 4"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation() {
        let provider = Arc::new(ScriptedProvider::texts([
            action("foo", "{}"),
            final_answer("Sorry."),
        ]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "Use foo").await;
        assert_eq!(result.unwrap().iterations(), 1);

        let error = events
            .iter()
            .find_map(|e| match e {
                AgentEvent::ToolError { error, .. } => Some(error.clone()),
                _ => None,
            })
            .unwrap();
        assert!(error.starts_with("Unknown tool: foo"));
        assert!(error.contains("calculator"));
        assert!(conv.turns()[2].content.contains("Observation: Unknown tool: foo"));
    }

    #[tokio::test]
    async fn exhaustion_stops_after_max_iterations() {
        let replies: Vec<String> = (0..11)
            .map(|_| action("calculator", r#"{"expression": "1 + 1"}"#))
            .collect();
        let provider = Arc::new(ScriptedProvider::texts(replies));
        let agent = agent(provider.clone());
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "Loop forever").await;

        assert_eq!(result.unwrap(), ReactOutcome::Exhausted { iterations: 10 });
        assert_eq!(provider.call_count(), 10);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AgentEvent::ToolCall { .. }))
                .count(),
            10
        );
        assert!(matches!(events.last(), Some(AgentEvent::Error { .. })));
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::StreamStart)));
    }

    #[tokio::test]
    async fn custom_iteration_cap() {
        let provider = Arc::new(ScriptedProvider::texts([
            action("calculator", r#"{"expression": "1"}"#),
            action("calculator", r#"{"expression": "2"}"#),
        ]));
        let agent = agent(provider.clone()).with_max_iterations(2);
        let mut conv = agent.new_conversation();

        let (result, _) = run(&agent, &mut conv, "q").await;
        assert_eq!(result.unwrap(), ReactOutcome::Exhausted { iterations: 2 });
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn unrecognized_reply_is_delivered_verbatim() {
        let provider = Arc::new(ScriptedProvider::texts(["Just chatting, no markers here."]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "Hey").await;
        assert_eq!(
            result.unwrap(),
            ReactOutcome::Answered {
                answer: "Just chatting, no markers here.".into(),
                iterations: 0,
                implicit: true
            }
        );
        assert_eq!(streamed_text(&events), "Just chatting, no markers here.");
    }

    #[tokio::test]
    async fn long_tool_output_is_truncated_in_event_only() {
        let provider = Arc::new(ScriptedProvider::texts([action("big", "{}"), final_answer("done")]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (_, events) = run(&agent, &mut conv, "big please").await;
        let result = events
            .iter()
            .find_map(|e| match e {
                AgentEvent::ToolResult { result, .. } => Some(result.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(result.len(), 2003);
        assert!(result.ends_with("..."));
        assert!(conv.turns()[2].content.contains(&"x".repeat(5000)));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_tool_times_out_and_loop_continues() {
        let provider = Arc::new(ScriptedProvider::texts([action("hang", "{}"), final_answer("gave up")]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "hang").await;
        assert_eq!(result.unwrap().answer(), Some("gave up"));
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::ToolError { error, .. } if error == "Tool hang timed out after 30 seconds"
        )));
    }

    #[tokio::test]
    async fn system_prompt_is_added_once_per_conversation() {
        let provider = Arc::new(ScriptedProvider::texts([final_answer("one"), final_answer("two")]));
        let agent = agent(provider.clone());
        let mut conv = agent.new_conversation();

        run(&agent, &mut conv, "first").await.0.unwrap();
        run(&agent, &mut conv, "second").await.0.unwrap();

        let systems = conv.turns().iter().filter(|t| t.role == Role::System).count();
        assert_eq!(systems, 1);
        assert_eq!(conv.len(), 5);

        let sent = &provider.requests()[0].turns[0];
        assert_eq!(sent.role, Role::System);
        assert!(sent.content.contains("2026-01-02"));
        assert!(sent.content.contains("### calculator"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
            "connection refused".into(),
        ))]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (result, events) = run(&agent, &mut conv, "hi").await;
        assert!(matches!(result, Err(Error::Provider(ProviderError::Network(_)))));
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::StreamStart)));
    }

    #[tokio::test]
    async fn answer_is_streamed_ten_words_at_a_time() {
        let answer = (1..=25).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let provider = Arc::new(ScriptedProvider::texts([final_answer(&answer)]));
        let agent = agent(provider);
        let mut conv = agent.new_conversation();

        let (_, events) = run(&agent, &mut conv, "count").await;
        let chunks: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::StreamChunk { content } => Some(content.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split_whitespace().count(), 10);
        assert_eq!(chunks[2].split_whitespace().count(), 5);
        assert_eq!(chunks.concat(), answer);
    }

    #[tokio::test]
    async fn run_stream_returns_conversation_and_events() {
        let provider = Arc::new(ScriptedProvider::texts([
            action("calculator", r#"{"expression": "6 * 7"}"#),
            final_answer("42"),
        ]));
        let agent = Arc::new(agent(provider));

        let mut run = agent.run_stream(agent.new_conversation(), "6 times 7?");
        let mut events = Vec::new();
        while let Some(event) = run.events.recv().await {
            events.push(event);
        }
        let (conv, result) = run.handle.await.unwrap();

        assert_eq!(result.unwrap().answer(), Some("42"));
        assert_eq!(conv.len(), 4);
        assert!(matches!(events.last(), Some(AgentEvent::StreamEnd)));
        assert_eq!(streamed_text(&events), "42");
    }

    #[tokio::test]
    async fn run_stream_reports_provider_errors_as_events() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let agent = Arc::new(agent(provider));

        let mut run = agent.run_stream(agent.new_conversation(), "hi");
        let mut last = None;
        while let Some(event) = run.events.recv().await {
            last = Some(event);
        }
        match last {
            Some(AgentEvent::Error { content }) => assert!(content.contains("bad key")),
            other => panic!("expected error event, got {other:?}"),
        }
        assert!(run.handle.await.unwrap().1.is_err());
    }

    #[tokio::test]
    async fn history_cap_keeps_system_turn() {
        let replies: Vec<String> = (0..6)
            .map(|_| action("calculator", r#"{"expression": "1"}"#))
            .chain([final_answer("ok")])
            .collect();
        let provider = Arc::new(ScriptedProvider::texts(replies));
        let agent = agent(provider).with_max_history_turns(4);
        let mut conv = agent.new_conversation();

        run(&agent, &mut conv, "go").await.0.unwrap();
        assert_eq!(conv.len(), 4);
        assert_eq!(conv.turns()[0].role, Role::System);
    }

    #[test]
    fn word_chunks_preserve_text() {
        let text = "one two  three\nfour five";
        let chunks = word_chunks(text, 2);
        assert_eq!(chunks, ["one two  ", "three\nfour ", "five"]);
        assert_eq!(chunks.concat(), text);
        assert!(word_chunks("", 10).is_empty());
    }

    #[test]
    fn preview_counts_characters() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn from_config_applies_settings() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 3;
        config.agent.max_history_turns = 12;
        let provider = Arc::new(ScriptedProvider::texts(Vec::<String>::new()));
        let agent = ReactAgent::from_config(provider, tools(), &config).unwrap();

        assert_eq!(agent.max_iterations(), 3);
        assert_eq!(agent.new_conversation().max_turns(), 12);
        assert_eq!(agent.model(), config.default_model);
    }

    #[test]
    fn from_config_rejects_invalid_settings() {
        let mut config = AppConfig::default();
        config.agent.tool_timeout_secs = 0;
        let provider = Arc::new(ScriptedProvider::texts(Vec::<String>::new()));

        match ReactAgent::from_config(provider, tools(), &config) {
            Err(Error::Config { message }) => assert!(message.contains("agent.tool_timeout_secs")),
            Err(other) => panic!("expected a config error, got {other}"),
            Ok(_) => panic!("expected a config error"),
        }
    }
}
