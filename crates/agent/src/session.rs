//! A session: one conversation driven by a shared agent.
//!
//! Sessions own their history and nothing else. Any number of them can
//! run side by side over the same `Arc<ReactAgent>`; the only shared state
//! is the tool registry and whatever stores the tools hold.

use std::sync::Arc;
use textloop_core::error::Error;
use textloop_core::message::{Conversation, SessionId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::react::{ReactAgent, ReactOutcome};
use crate::stream_event::AgentEvent;

pub struct Session {
    conversation: Conversation,
    agent: Arc<ReactAgent>,
}

impl Session {
    pub fn new(agent: Arc<ReactAgent>) -> Self {
        let conversation = agent.new_conversation();
        debug!(session_id = %conversation.id, "Session created");
        Self {
            conversation,
            agent,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.conversation.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn agent(&self) -> &Arc<ReactAgent> {
        &self.agent
    }

    /// Run one user turn, reporting progress on `events`.
    ///
    /// An exhausted run leaves the session usable for the next message.
    pub async fn send(
        &mut self,
        message: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<ReactOutcome, Error> {
        self.agent.run(&mut self.conversation, message, events).await
    }

    /// Run one user turn without listening to events.
    pub async fn ask(&mut self, message: &str) -> Result<ReactOutcome, Error> {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        self.send(message, &tx).await
    }

    /// Forget the conversation and start over under a new id.
    pub fn reset(&mut self) {
        self.conversation = self.agent.new_conversation();
        debug!(session_id = %self.conversation.id, "Session reset");
    }
}
