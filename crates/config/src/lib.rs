//! Configuration loading, validation, and management for textloop.
//!
//! Loads configuration from `~/.textloop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.textloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// ReAct loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// ReAct loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard ceiling on tool-call rounds per user message
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Per-tool-call timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Turns retained per session (system turn included)
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    /// Words per `stream-chunk` event when delivering the final answer
    #[serde(default = "default_stream_chunk_words")]
    pub stream_chunk_words: usize,

    /// Pause between `stream-chunk` events
    #[serde(default = "default_stream_chunk_delay_ms")]
    pub stream_chunk_delay_ms: u64,

    /// Characters of tool output shown in `tool-result` events
    #[serde(default = "default_result_preview_chars")]
    pub result_preview_chars: usize,

    /// Extract `Action Input` by brace-depth counting instead of stopping
    /// at the first `}`
    #[serde(default)]
    pub balanced_braces: bool,

    /// Stop sequences sent with every model call
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_max_history_turns() -> usize {
    50
}
fn default_stream_chunk_words() -> usize {
    10
}
fn default_stream_chunk_delay_ms() -> u64 {
    30
}
fn default_result_preview_chars() -> usize {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
            max_history_turns: default_max_history_turns(),
            stream_chunk_words: default_stream_chunk_words(),
            stream_chunk_delay_ms: default_stream_chunk_delay_ms(),
            result_preview_chars: default_result_preview_chars(),
            balanced_braces: false,
            stop_sequences: vec![],
        }
    }
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// "static" (offline, deterministic) or "duckduckgo"
    #[serde(default = "default_search_backend")]
    pub search_backend: String,

    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,

    #[serde(default = "default_search_cache_capacity")]
    pub search_cache_capacity: usize,

    /// Directory `file_read` is confined to. Unset = current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_root: Option<PathBuf>,

    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    #[serde(default = "default_notes_capacity")]
    pub notes_capacity: usize,
}

fn default_search_backend() -> String {
    "static".into()
}
fn default_search_cache_ttl_secs() -> u64 {
    300
}
fn default_search_cache_capacity() -> usize {
    128
}
fn default_max_file_bytes() -> usize {
    64 * 1024
}
fn default_notes_capacity() -> usize {
    256
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_backend: default_search_backend(),
            search_cache_ttl_secs: default_search_cache_ttl_secs(),
            search_cache_capacity: default_search_cache_capacity(),
            file_root: None,
            max_file_bytes: default_max_file_bytes(),
            notes_capacity: default_notes_capacity(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.textloop/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TEXTLOOP_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TEXTLOOP_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TEXTLOOP_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("TEXTLOOP_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".textloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let agent = &self.agent;
        let zero_checks = [
            (agent.max_iterations == 0, "agent.max_iterations"),
            (agent.tool_timeout_secs == 0, "agent.tool_timeout_secs"),
            (agent.max_history_turns == 0, "agent.max_history_turns"),
            (agent.stream_chunk_words == 0, "agent.stream_chunk_words"),
            (agent.result_preview_chars == 0, "agent.result_preview_chars"),
        ];
        if let Some((_, field)) = zero_checks.iter().find(|(is_zero, _)| *is_zero) {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be greater than 0"
            )));
        }

        if !matches!(self.tools.search_backend.as_str(), "static" | "duckduckgo") {
            return Err(ConfigError::ValidationError(format!(
                "unknown tools.search_backend '{}' (expected 'static' or 'duckduckgo')",
                self.tools.search_backend
            )));
        }

        Ok(())
    }

    /// API key for a provider: per-provider entry first, then the global key.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.tool_timeout_secs, 30);
        assert_eq!(config.agent.max_history_turns, 50);
        assert_eq!(config.agent.stream_chunk_words, 10);
        assert_eq!(config.agent.result_preview_chars, 2000);
        assert!(!config.agent.balanced_braces);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.agent.max_iterations, config.agent.max_iterations);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("agent.max_iterations"));
    }

    #[test]
    fn unknown_search_backend_rejected() {
        let mut config = AppConfig::default();
        config.tools.search_backend = "bing".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openrouter");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
default_model = "llama3"

[agent]
max_iterations = 4
balanced_braces = true

[tools]
search_backend = "duckduckgo"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.agent.max_iterations, 4);
        assert!(config.agent.balanced_braces);
        assert_eq!(config.agent.tool_timeout_secs, 30);
        assert_eq!(config.tools.search_backend, "duckduckgo");
        assert_eq!(config.tools.notes_capacity, 256);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "agent = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn provider_key_overrides_global() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("scoped".into()),
                ..ProviderConfig::default()
            },
        );
        assert_eq!(config.api_key_for("openai").as_deref(), Some("scoped"));
        assert_eq!(config.api_key_for("openrouter").as_deref(), Some("global"));
    }

    #[test]
    fn debug_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("max_iterations = 10"));
    }
}
