//! Action executor — runs one parsed action and turns every outcome into
//! observation text the model can read.
//!
//! Nothing here returns an error: an unknown tool, a timeout or a failing
//! tool all become an [`Observation`] flagged `is_error`.

use std::sync::Arc;
use std::time::{Duration, Instant};
use textloop_core::error::ToolError;
use textloop_core::tool::ToolRegistry;
use tracing::{debug, warn};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// The text fed back to the model after a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub text: String,
    pub is_error: bool,
    pub duration_ms: u64,
}

pub struct ActionExecutor {
    tools: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `tool_name` with `args`, bounded by the timeout.
    ///
    /// On timeout the tool's future is dropped. Work the tool handed to
    /// other tasks keeps running.
    pub async fn execute(
        &self,
        tool_name: &str,
        args: serde_json::Map<String, serde_json::Value>,
    ) -> Observation {
        let started = Instant::now();
        let elapsed = |start: Instant| start.elapsed().as_millis() as u64;

        let Some(tool) = self.tools.get(tool_name) else {
            warn!(tool = tool_name, "Model requested an unknown tool");
            return Observation {
                text: format!(
                    "Unknown tool: {tool_name}. Available tools: {}",
                    self.tools.names().join(", ")
                ),
                is_error: true,
                duration_ms: 0,
            };
        };

        let outcome =
            tokio::time::timeout(self.timeout, tool.execute(serde_json::Value::Object(args))).await;

        let observation = match outcome {
            Err(_) => {
                let err = ToolError::Timeout {
                    tool_name: tool_name.to_string(),
                    timeout: self.timeout,
                };
                warn!(tool = tool_name, timeout_ms = self.timeout.as_millis() as u64, "Tool timed out");
                Observation {
                    text: err.to_string(),
                    is_error: true,
                    duration_ms: elapsed(started),
                }
            }
            Ok(Err(e)) => Observation {
                text: format!("Error: {e}"),
                is_error: true,
                duration_ms: elapsed(started),
            },
            Ok(Ok(result)) => Observation {
                text: result.output,
                is_error: !result.success,
                duration_ms: elapsed(started),
            },
        };

        debug!(
            tool = tool_name,
            duration_ms = observation.duration_ms,
            is_error = observation.is_error,
            "Tool call finished"
        );
        observation
    }
}
