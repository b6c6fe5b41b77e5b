//! File read tool — reads text files inside a sandbox root.
//!
//! Paths are resolved against the root and canonicalized; anything that
//! lands outside it (via `..`, absolute paths or symlinks) is refused.
//! Output is capped at `max_bytes`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use textloop_core::error::ToolError;
use textloop_core::tool::{Tool, ToolResult};
use tokio::io::AsyncReadExt;
use tracing::debug;

pub const DEFAULT_MAX_BYTES: usize = 64 * 1024;

pub struct FileReadTool {
    root: PathBuf,
    max_bytes: usize,
}

impl FileReadTool {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes: max_bytes.max(1),
        }
    }

    fn denied(reason: impl Into<String>) -> ToolError {
        ToolError::PermissionDenied {
            tool_name: "file_read".into(),
            reason: reason.into(),
        }
    }

    /// Resolve `requested` to a canonical path under the root.
    fn resolve(&self, requested: &str) -> Result<PathBuf, ToolError> {
        let root = self
            .root
            .canonicalize()
            .map_err(|e| Self::denied(format!("sandbox root unavailable: {e}")))?;

        let requested = Path::new(requested);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            root.join(requested)
        };

        let canonical = joined
            .canonicalize()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "file_read".into(),
                reason: format!("Failed to read file: {e}"),
            })?;

        if !canonical.starts_with(&root) {
            return Err(Self::denied(format!(
                "'{}' is outside the readable directory",
                requested.display()
            )));
        }
        Ok(canonical)
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read a text file. Paths are relative to the working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let resolved = self.resolve(path)?;
        if resolved.is_dir() {
            return Ok(ToolResult::failed(format!("'{path}' is a directory")));
        }

        let file = match tokio::fs::File::open(&resolved).await {
            Ok(f) => f,
            Err(e) => return Ok(ToolResult::failed(format!("Failed to read file: {e}"))),
        };

        let mut buf = Vec::new();
        let limit = self.max_bytes as u64;
        if let Err(e) = file.take(limit + 1).read_to_end(&mut buf).await {
            return Ok(ToolResult::failed(format!("Failed to read file: {e}")));
        }

        let truncated = buf.len() > self.max_bytes;
        if truncated {
            // Back off to a character boundary so the cut never splits a UTF-8 sequence.
            let keep = match std::str::from_utf8(&buf[..self.max_bytes]) {
                Ok(_) => self.max_bytes,
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(_) => self.max_bytes,
            };
            buf.truncate(keep);
        }
        let mut output = String::from_utf8_lossy(&buf).into_owned();
        if truncated {
            output.push_str(&format!("\n[truncated at {} bytes]", self.max_bytes));
        }

        debug!(path = %resolved.display(), bytes = buf.len(), truncated, "Read file");
        Ok(ToolResult::ok(output))
    }
}
