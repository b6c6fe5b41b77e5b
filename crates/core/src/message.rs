//! Conversation turns and the capped history that holds them.
//!
//! A ReAct exchange never uses a separate "tool" role: the model's action
//! request and the tool's observation travel together inside one `Ai` turn,
//! because that is the format the model was taught. The history is capped;
//! the oldest non-system turns are evicted first and the system turn stays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of turns a conversation retains.
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Unique identifier for a session's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Protocol instructions and tool catalogue.
    System,
    /// The end user.
    Human,
    /// The model, possibly with an appended `Observation:` block.
    Ai,
}

/// A single entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }

    /// An AI turn that carries the model's raw action text plus the
    /// observation produced by running it.
    pub fn ai_with_observation(raw: &str, observation: &str) -> Self {
        Self::ai(format!("{raw}\n\nObservation: {observation}\n\n"))
    }
}

/// An ordered, capped sequence of turns for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: SessionId,

    turns: Vec<Turn>,

    #[serde(default = "default_max_turns")]
    max_turns: usize,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    /// Create an empty conversation retaining at most `max_turns` turns.
    /// A cap of zero is treated as one.
    pub fn with_max_turns(max_turns: usize) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            turns: Vec::new(),
            max_turns: max_turns.max(1),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn has_system(&self) -> bool {
        self.turns.first().is_some_and(|t| t.role == Role::System)
    }

    /// Insert the system turn at the front if none exists yet.
    ///
    /// Returns `true` when the turn was inserted. An existing system turn is
    /// left untouched.
    pub fn ensure_system(&mut self, content: impl Into<String>) -> bool {
        if self.has_system() {
            return false;
        }
        self.turns.insert(0, Turn::system(content));
        self.touch();
        true
    }

    /// Append a turn, evicting the oldest non-system turns past the cap.
    ///
    /// System turns are routed through [`Conversation::ensure_system`] so the
    /// conversation never holds more than one, and never anywhere but first.
    pub fn push(&mut self, turn: Turn) {
        if turn.role == Role::System {
            self.ensure_system(turn.content);
            return;
        }
        self.turns.push(turn);
        self.evict();
        self.touch();
    }

    fn evict(&mut self) {
        while self.turns.len() > self.max_turns {
            let oldest = usize::from(self.has_system());
            if oldest >= self.turns.len() {
                break;
            }
            self.turns.remove(oldest);
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
