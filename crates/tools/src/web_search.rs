//! Web search tool with a pluggable backend and a shared result cache.
//!
//! Two backends ship: [`StaticSearchBackend`] returns deterministic canned
//! results so the loop can run without network access, and
//! [`DuckDuckGoBackend`] calls the DuckDuckGo instant-answer API.
//! Results are cached in an injected [`TtlCache`] keyed by the normalized
//! query, so repeated searches from any session skip the backend.

use crate::cache::TtlCache;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use textloop_core::error::ToolError;
use textloop_core::tool::{Tool, ToolResult};
use tracing::{debug, warn};

const DEFAULT_RESULTS: usize = 3;
const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub type SearchCache = TtlCache<String, Vec<SearchResult>>;

/// Where search results come from.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError>;
}

pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
    cache: Arc<SearchCache>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>, cache: Arc<SearchCache>) -> Self {
        Self { backend, cache }
    }

    fn cache_key(query: &str, limit: usize) -> String {
        let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{}|{limit}", normalized.to_lowercase())
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns a list of results with titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 3, max 5)",
                    "default": DEFAULT_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let limit = arguments["num_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_RESULTS)
            .clamp(1, MAX_RESULTS);

        let key = Self::cache_key(query, limit);
        let results = match self.cache.get(&key).await {
            Some(hit) => {
                debug!(query, backend = self.backend.name(), "Search cache hit");
                hit
            }
            None => {
                let fresh = self.backend.search(query, limit).await?;
                self.cache.insert(key, fresh.clone()).await;
                fresh
            }
        };

        if results.is_empty() {
            return Ok(ToolResult::ok(format!("No results found for '{query}'.")));
        }

        let output = render(&results);
        let data = serde_json::to_value(&results).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "web_search".into(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::ok(output).with_data(data))
    }
}

fn render(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Static backend ---

/// Deterministic offline results keyed on words in the query.
pub struct StaticSearchBackend;

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError> {
        Ok(static_results(query, limit))
    }
}

fn result(title: &str, url: &str, snippet: &str) -> SearchResult {
    SearchResult {
        title: title.into(),
        url: url.into(),
        snippet: snippet.into(),
    }
}

fn static_results(query: &str, limit: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    if q.contains("rust") {
        return [
            result(
                "The Rust Programming Language",
                "https://doc.rust-lang.org/book/",
                "Rust is a systems programming language focused on safety, speed, and concurrency.",
            ),
            result(
                "Rust by Example",
                "https://doc.rust-lang.org/rust-by-example/",
                "A collection of runnable examples that illustrate Rust concepts and standard library usage.",
            ),
            result(
                "crates.io: Rust Package Registry",
                "https://crates.io/",
                "The Rust community's crate registry for sharing and discovering Rust libraries.",
            ),
        ]
        .into_iter()
        .take(limit)
        .collect();
    }

    if q.contains("weather") {
        return [
            result(
                "Weather Forecast - National Weather Service",
                "https://weather.gov/",
                "Current conditions and forecasts for locations across the United States.",
            ),
            result(
                "OpenWeatherMap",
                "https://openweathermap.org/",
                "Free weather API providing current weather data and forecasts for any location.",
            ),
        ]
        .into_iter()
        .take(limit)
        .collect();
    }

    (0..limit)
        .map(|i| SearchResult {
            title: format!("Result {} for: {query}", i + 1),
            url: format!("https://example.com/search?q={}&p={}", query.replace(' ', "+"), i + 1),
            snippet: format!("Offline placeholder result for the query '{query}'."),
        })
        .collect()
}

// --- DuckDuckGo backend ---

/// The DuckDuckGo instant-answer API. No key required.
pub struct DuckDuckGoBackend {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoBackend {
    pub fn new() -> Self {
        Self::with_base_url("https://api.duckduckgo.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("textloop/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

impl Default for DuckDuckGoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool_name: "web_search".into(),
            reason,
        };

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), query, "Search backend returned error");
            return Err(failed(format!("search backend returned HTTP {}", status.as_u16())));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable search response: {e}")))?;

        Ok(answer.into_results(limit))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "FirstURL")]
    first_url: Option<String>,
    /// Category groups nest further topics.
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

impl InstantAnswer {
    fn into_results(self, limit: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();
        if !self.abstract_text.is_empty() {
            results.push(SearchResult {
                title: self.heading.clone(),
                url: self.abstract_url,
                snippet: self.abstract_text,
            });
        }

        let mut stack: Vec<RelatedTopic> = self.related_topics.into_iter().rev().collect();
        while let Some(topic) = stack.pop() {
            if results.len() >= limit {
                break;
            }
            if let (Some(text), Some(url)) = (topic.text, topic.first_url) {
                let title = text.split(" - ").next().unwrap_or(&text).to_string();
                results.push(SearchResult {
                    title,
                    url,
                    snippet: text,
                });
            }
            stack.extend(topic.topics.into_iter().rev());
        }

        results.truncate(limit);
        results
    }
}
