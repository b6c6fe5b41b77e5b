//! Notes tool — a scratchpad the agent can write to and read back.
//!
//! Notes live in an injected [`NoteStore`] shared by every session. The
//! store is bounded; adding past capacity drops the oldest note.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use textloop_core::error::ToolError;
use textloop_core::tool::{Tool, ToolResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A bounded, concurrency-safe note store.
pub struct NoteStore {
    notes: RwLock<VecDeque<Note>>,
    capacity: usize,
}

impl NoteStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            notes: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn add(&self, title: &str, content: &str) -> Note {
        let note = Note {
            id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let mut notes = self.notes.write().await;
        while notes.len() >= self.capacity {
            notes.pop_front();
        }
        notes.push_back(note.clone());
        note
    }

    pub async fn get(&self, id: &str) -> Option<Note> {
        self.notes.read().await.iter().find(|n| n.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Note> {
        self.notes.read().await.iter().cloned().collect()
    }

    /// Case-insensitive match on title or content.
    pub async fn search(&self, text: &str) -> Vec<Note> {
        let needle = text.to_lowercase();
        self.notes
            .read()
            .await
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub async fn delete(&self, id: &str) -> bool {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        notes.len() < before
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct NotesTool {
    store: Arc<NoteStore>,
}

impl NotesTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

fn required<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn summarize(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("[{}] {}", n.id, n.title))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for NotesTool {
    fn name(&self) -> &str {
        "notes"
    }

    fn description(&self) -> &str {
        "Save and recall short notes. Actions: add (title, content), list, get (id), search (query), delete (id)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["add", "list", "get", "search", "delete"],
                    "description": "What to do"
                },
                "title": { "type": "string", "description": "Note title (add)" },
                "content": { "type": "string", "description": "Note body (add)" },
                "id": { "type": "string", "description": "Note id (get, delete)" },
                "query": { "type": "string", "description": "Text to look for (search)" }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let action = required(&arguments, "action")?;

        match action {
            "add" => {
                let title = required(&arguments, "title")?;
                let content = arguments["content"].as_str().unwrap_or_default();
                let note = self.store.add(title, content).await;
                Ok(ToolResult::ok(format!("Saved note {} ({})", note.id, note.title)))
            }
            "list" => {
                let notes = self.store.list().await;
                if notes.is_empty() {
                    return Ok(ToolResult::ok("No notes saved."));
                }
                Ok(ToolResult::ok(summarize(&notes)))
            }
            "get" => {
                let id = required(&arguments, "id")?;
                match self.store.get(id).await {
                    Some(note) => Ok(ToolResult::ok(format!("{}\n\n{}", note.title, note.content))),
                    None => Ok(ToolResult::failed(format!("No note with id {id}"))),
                }
            }
            "search" => {
                let query = required(&arguments, "query")?;
                let found = self.store.search(query).await;
                if found.is_empty() {
                    return Ok(ToolResult::ok(format!("No notes match '{query}'.")));
                }
                Ok(ToolResult::ok(summarize(&found)))
            }
            "delete" => {
                let id = required(&arguments, "id")?;
                if self.store.delete(id).await {
                    Ok(ToolResult::ok(format!("Deleted note {id}")))
                } else {
                    Ok(ToolResult::failed(format!("No note with id {id}")))
                }
            }
            other => Err(ToolError::InvalidArguments(format!(
                "Unknown action '{other}'. Expected one of: add, list, get, search, delete"
            ))),
        }
    }
}
