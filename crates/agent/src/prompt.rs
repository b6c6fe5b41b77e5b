//! System prompt construction.
//!
//! The prompt teaches the model the text protocol, lists every tool with
//! its schema, shows one worked exchange and states today's date so the
//! model does not assume its training year when deciding whether to search.

use chrono::{Datelike, NaiveDate};
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use textloop_core::tool::ToolRegistry;
use tracing::debug;

/// Build the system prompt for `tools` as of `today`. Pure.
pub fn build_system_prompt(tools: &ToolRegistry, today: NaiveDate) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are a helpful assistant that answers questions by reasoning step by step \
         and using tools when they help.\n\n",
    );
    let _ = writeln!(
        prompt,
        "Today's date is {} ({}). The current year is {}. Do not assume an earlier year; \
         search when the question depends on recent events.\n",
        today.format("%Y-%m-%d"),
        today.format("%A, %B %-d"),
        today.year()
    );

    prompt.push_str("## Tools\n\n");
    if tools.is_empty() {
        prompt.push_str("No tools are available. Answer directly.\n");
    }
    for def in tools.definitions() {
        let _ = writeln!(prompt, "### {}\n{}", def.name, def.description);
        let _ = writeln!(prompt, "Parameters (JSON Schema): {}\n", def.parameters);
    }

    prompt.push_str(
        "## Format\n\n\
         To use a tool, reply with exactly these lines and then stop:\n\n\
         Thought: <your reasoning>\n\
         Action: <tool name>\n\
         Action Input: <a single-line JSON object matching the tool's parameters>\n\
         PAUSE\n\n\
         You will then receive:\n\n\
         Observation: <the tool's result>\n\n\
         When you can answer, reply with:\n\n\
         Thought: <your reasoning>\n\
         Final Answer: <your answer for the user>\n\n\
         Rules:\n\
         - Use one Action per reply. Never write an Observation yourself.\n\
         - The Action line holds only the tool name.\n\
         - Never combine an Action and a Final Answer in one reply.\n\n",
    );

    prompt.push_str(
        "## Example\n\n\
         User: What is 12% of 250?\n\n\
         Thought: I should compute this instead of guessing.\n\
         Action: calculator\n\
         Action Input: {\"expression\": \"250 * 12 / 100\"}\n\
         PAUSE\n\n\
         Observation: 30\n\n\
         Thought: The calculator gave the result.\n\
         Final Answer: 12% of 250 is 30.\n",
    );

    prompt
}

/// Caches the prompt for as long as the registry and the date are unchanged.
#[derive(Default)]
pub struct PromptCache {
    cached: Mutex<Option<CachedPrompt>>,
}

struct CachedPrompt {
    fingerprint: u64,
    date: NaiveDate,
    prompt: Arc<str>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tools: &ToolRegistry, today: NaiveDate) -> Arc<str> {
        let fingerprint = tools.fingerprint();
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(hit) = cached.as_ref()
            && hit.fingerprint == fingerprint
            && hit.date == today
        {
            return hit.prompt.clone();
        }

        debug!(fingerprint, %today, tools = tools.len(), "Building system prompt");
        let prompt: Arc<str> = build_system_prompt(tools, today).into();
        *cached = Some(CachedPrompt {
            fingerprint,
            date: today,
            prompt: prompt.clone(),
        });
        prompt
    }
}
