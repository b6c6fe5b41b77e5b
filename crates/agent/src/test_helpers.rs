//! Shared test helpers for agent tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use textloop_core::error::{ProviderError, ToolError};
use textloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use textloop_core::tool::{Tool, ToolResult};
use tokio::sync::mpsc;

use crate::stream_event::AgentEvent;

/// A mock provider that replays scripted replies in order.
///
/// Every request is recorded for later inspection. Panics if called more
/// times than there are replies.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|s| Ok(s.into())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        let reply = {
            let replies = self.replies.lock().unwrap();
            if call >= replies.len() {
                panic!(
                    "ScriptedProvider: no more replies (call #{call}, have {})",
                    replies.len()
                );
            }
            replies[call].clone()
        };

        reply.map(|text| ProviderResponse {
            text,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

/// A reply asking for `tool` with a JSON `input`.
pub fn action(tool: &str, input: &str) -> String {
    format!("Thought: I should use {tool}.\nAction: {tool}\nAction Input: {input}\nPAUSE")
}

pub fn final_answer(text: &str) -> String {
    format!("Thought: I know the answer.\nFinal Answer: {text}")
}

/// Returns `size` copies of 'x'.
pub struct BigOutputTool {
    pub size: usize,
}

#[async_trait]
impl Tool for BigOutputTool {
    fn name(&self) -> &str {
        "big"
    }
    fn description(&self) -> &str {
        "Produces a large output"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok("x".repeat(self.size)))
    }
}

/// Never finishes within any sane timeout.
pub struct HangingTool;

#[async_trait]
impl Tool for HangingTool {
    fn name(&self) -> &str {
        "hang"
    }
    fn description(&self) -> &str {
        "Hangs"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ToolResult::ok("woke up"))
    }
}

/// Drain everything currently buffered in `rx`.
pub fn drain(rx: &mut mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
