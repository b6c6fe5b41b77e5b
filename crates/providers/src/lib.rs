//! LLM provider implementations for textloop.
//!
//! Every provider implements `textloop_core::Provider`. [`build_from_config`]
//! picks the configured one.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use textloop_config::AppConfig;
use textloop_core::Provider;
use textloop_core::error::ProviderError;

/// Build the default provider named in the configuration.
///
/// Every supported backend speaks the OpenAI chat-completions dialect, so
/// the name only selects the base URL and whether a key is required.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let scoped = config.providers.get(name);

    let base_url = scoped
        .and_then(|p| p.api_url.clone())
        .or_else(|| default_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{name}' has no api_url and no built-in default"
            ))
        })?;

    let api_key = match config.api_key_for(name) {
        Some(key) => key,
        None if name == "ollama" => "ollama".to_string(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'"
            )));
        }
    };

    tracing::debug!(provider = name, base_url = %base_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Well-known base URLs.
pub fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        _ => None,
    }
}
