//! Response parser — turns raw model text into the next ReAct step.
//!
//! Matching order, first match wins:
//!
//! 1. `Final Answer:` (any case) → [`ReactStep::FinalAnswer`] with the
//!    trimmed text after the marker. Beats an `Action:` in the same reply.
//! 2. `Action: <tool_name>` → [`ReactStep::ToolAction`]. The nearest
//!    preceding `Thought:` line becomes the thought.
//! 3. Anything else → [`ReactStep::Unrecognized`], later delivered as-is.
//!
//! `Action Input:` is read leniently. By default the slice from the first
//! `{` to the first `}` after it is parsed as JSON, which breaks on nested
//! objects but matches what most models produce for flat arguments. When
//! that fails a lone `"query": "..."` pair is rescued, otherwise the
//! arguments are `{}`. Tool names are not checked against the registry here.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FINAL_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final answer\s*:").expect("valid final-answer pattern"));

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Action:[ \t]*([A-Za-z_][A-Za-z0-9_.-]*)").expect("valid action pattern")
});

static THOUGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Thought:[ \t]*([^\r\n]*)").expect("valid thought pattern"));

static QUERY_RESCUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""query"\s*:\s*"([^"}\r\n]*)"#).expect("valid query pattern"));

const ACTION_INPUT: &str = "Action Input:";

/// What the model asked for in one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactStep {
    /// Terminal: the answer for the user.
    FinalAnswer { text: String },

    /// Non-terminal: run a tool and feed back the observation.
    ToolAction {
        thought: String,
        tool_name: String,
        args: serde_json::Map<String, serde_json::Value>,
    },

    /// Neither marker found. The raw reply stands in as the answer.
    Unrecognized { raw: String },
}

/// Parser for the text protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser {
    balanced_braces: bool,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract `Action Input` by brace-depth counting instead of stopping
    /// at the first `}`.
    pub fn with_balanced_braces(mut self, enabled: bool) -> Self {
        self.balanced_braces = enabled;
        self
    }

    pub fn parse(&self, raw: &str) -> ReactStep {
        if let Some(m) = FINAL_ANSWER.find(raw) {
            return ReactStep::FinalAnswer {
                text: raw[m.end()..].trim().to_string(),
            };
        }

        let Some(caps) = ACTION.captures(raw) else {
            return ReactStep::Unrecognized {
                raw: raw.to_string(),
            };
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return ReactStep::Unrecognized {
                raw: raw.to_string(),
            };
        };

        let thought = THOUGHT
            .captures_iter(&raw[..whole.start()])
            .last()
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let after_action = &raw[whole.end()..];
        let input_text = after_action
            .find(ACTION_INPUT)
            .map(|i| &after_action[i + ACTION_INPUT.len()..])
            .unwrap_or(after_action);

        ReactStep::ToolAction {
            thought,
            tool_name: name.as_str().to_string(),
            args: self.parse_args(input_text),
        }
    }

    fn parse_args(&self, text: &str) -> serde_json::Map<String, serde_json::Value> {
        let slice = if self.balanced_braces {
            balanced_object(text)
        } else {
            first_brace_pair(text)
        };

        if let Some(slice) = slice
            && let Ok(serde_json::Value::Object(map)) = serde_json::from_str(slice)
        {
            return map;
        }

        let mut rescued = serde_json::Map::new();
        if let Some(query) = QUERY_RESCUE.captures(text).and_then(|c| c.get(1)) {
            rescued.insert(
                "query".into(),
                serde_json::Value::String(query.as_str().to_string()),
            );
        }
        rescued
    }
}

/// Parse with the default first-`}` extraction.
pub fn parse_response(raw: &str) -> ReactStep {
    ResponseParser::new().parse(raw)
}

/// From the first `{` through the first `}` after it.
fn first_brace_pair(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text[start..].find('}')? + start;
    Some(&text[start..=end])
}

/// From the first `{` through its matching `}`, skipping braces inside
/// JSON strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn well_formed_action() {
        let raw = "Thought: need weather\nAction: web_search\nAction Input: {\"query\": \"Paris weather\"}\nPAUSE";
        assert_eq!(
            parse_response(raw),
            ReactStep::ToolAction {
                thought: "need weather".into(),
                tool_name: "web_search".into(),
                args: args(json!({"query": "Paris weather"})),
            }
        );
    }

    #[test]
    fn final_answer_is_trimmed() {
        let raw = "Thought: I know this.\nFinal Answer:   It's sunny, 22°C.  \n";
        assert_eq!(
            parse_response(raw),
            ReactStep::FinalAnswer {
                text: "It's sunny, 22°C.".into()
            }
        );
    }

    #[test]
    fn final_answer_is_case_insensitive() {
        assert_eq!(
            parse_response("FINAL ANSWER: 42"),
            ReactStep::FinalAnswer { text: "42".into() }
        );
        assert_eq!(
            parse_response("final answer: 42"),
            ReactStep::FinalAnswer { text: "42".into() }
        );
    }

    #[test]
    fn final_answer_wins_over_action() {
        let raw = "Action: calculator\nAction Input: {\"expression\": \"1+1\"}\nFinal Answer: 2";
        assert_eq!(parse_response(raw), ReactStep::FinalAnswer { text: "2".into() });
    }

    #[test]
    fn final_answer_may_span_lines() {
        let raw = "Final Answer: line one\nline two";
        assert_eq!(
            parse_response(raw),
            ReactStep::FinalAnswer {
                text: "line one\nline two".into()
            }
        );
    }

    #[test]
    fn plain_text_is_unrecognized() {
        let raw = "Hello there, how can I help?";
        assert_eq!(
            parse_response(raw),
            ReactStep::Unrecognized { raw: raw.into() }
        );
    }

    #[test]
    fn missing_thought_defaults_to_empty() {
        match parse_response("Action: calculator\nAction Input: {\"expression\": \"2+2\"}") {
            ReactStep::ToolAction {
                thought, tool_name, ..
            } => {
                assert_eq!(thought, "");
                assert_eq!(tool_name, "calculator");
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn thought_is_the_line_before_the_action() {
        let raw = "Thought: first idea\nThought: better idea\nAction: notes\nAction Input: {\"action\": \"list\"}";
        match parse_response(raw) {
            ReactStep::ToolAction { thought, .. } => assert_eq!(thought, "better idea"),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tool_names_are_not_rejected() {
        match parse_response("Action: teleport\nAction Input: {}") {
            ReactStep::ToolAction { tool_name, args, .. } => {
                assert_eq!(tool_name, "teleport");
                assert!(args.is_empty());
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_rescues_query() {
        let raw = "Action: web_search\nAction Input: {\"query\": \"rust async\", oops}";
        match parse_response(raw) {
            ReactStep::ToolAction { args: a, .. } => assert_eq!(a, args(json!({"query": "rust async"}))),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_query_is_rescued() {
        let raw = "Thought: look it up\nAction: web_search\nAction Input: {\"query\": \"weather}\nPAUSE";
        match parse_response(raw) {
            ReactStep::ToolAction { args: a, .. } => assert_eq!(a, args(json!({"query": "weather"}))),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn first_brace_heuristic_truncates_nested_objects() {
        let raw = "Action: lookup\nAction Input: {\"filter\": {\"query\": \"x\"}, \"limit\": 2}";
        match parse_response(raw) {
            // `{"filter": {"query": "x"}` does not parse; the query pair is rescued.
            ReactStep::ToolAction { args: a, .. } => assert_eq!(a, args(json!({"query": "x"}))),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn balanced_mode_reads_nested_objects() {
        let parser = ResponseParser::new().with_balanced_braces(true);
        let raw = "Action: lookup\nAction Input: {\"filter\": {\"tag\": \"}\"}, \"limit\": 2}\nPAUSE";
        match parser.parse(raw) {
            ReactStep::ToolAction { args: a, .. } => {
                assert_eq!(a, args(json!({"filter": {"tag": "}"}, "limit": 2})))
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn garbage_input_yields_empty_args() {
        match parse_response("Action: calculator\nAction Input: two plus two") {
            ReactStep::ToolAction { args, .. } => assert!(args.is_empty()),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn non_object_json_yields_empty_args() {
        match parse_response("Action: calculator\nAction Input: [1, 2]") {
            ReactStep::ToolAction { args, .. } => assert!(args.is_empty()),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn action_name_stops_at_whitespace() {
        match parse_response("Action: web_search {\"query\": \"x\"}") {
            ReactStep::ToolAction { tool_name, args: a, .. } => {
                assert_eq!(tool_name, "web_search");
                assert_eq!(a, args(json!({"query": "x"})));
            }
            other => panic!("expected action, got {other:?}"),
        }
    }
}
