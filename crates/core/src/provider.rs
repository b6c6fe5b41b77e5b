//! Provider trait — the abstraction over language-model backends.
//!
//! The ReAct loop only needs text in and text out: the whole conversation
//! goes in, the model's raw reply comes back. Native function calling is
//! deliberately absent from this seam.

use crate::error::ProviderError;
use crate::message::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "openai/gpt-4o-mini")
    pub model: String,

    /// The full conversation, system turn first
    pub turns: Vec<Turn>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete (non-streaming) reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The raw generated text
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One fragment of a streamed reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial text delta
    #[serde(default)]
    pub content: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The core Provider trait.
///
/// The agent loop calls [`Provider::invoke`] once per iteration without
/// knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send the conversation and get the model's full text reply.
    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Send the conversation and get the reply as a sequence of fragments.
    ///
    /// Default implementation calls `invoke()` and yields one chunk.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>
    {
        let response = self.invoke(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: response.text,
                done: true,
            }))
            .await;
        Ok(rx)
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let last = request.turns.last().map(|t| t.content.clone()).unwrap_or_default();
            Ok(ProviderResponse {
                text: last,
                usage: None,
                model: request.model,
            })
        }
    }

    fn request(text: &str) -> ProviderRequest {
        ProviderRequest {
            model: "echo-1".into(),
            turns: vec![Turn::human(text)],
            temperature: default_temperature(),
            max_tokens: None,
            stop: vec![],
        }
    }

    #[test]
    fn provider_request_defaults() {
        let req = request("x");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("stop"));
    }

    #[tokio::test]
    async fn default_stream_wraps_invoke() {
        let mut rx = EchoProvider.stream(request("hello")).await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.content, "hello");
        assert!(chunk.done);
        assert!(rx.recv().await.is_none());
    }
}
