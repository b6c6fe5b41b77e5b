//! # Textloop Core
//!
//! Domain types, traits, and error definitions shared by every textloop
//! crate. Nothing here knows about HTTP, configuration files, or concrete
//! tools.
//!
//! ## Layout
//!
//! - [`message`] — conversation turns and the capped history they live in
//! - [`provider`] — the text-in/text-out language model seam
//! - [`tool`] — the tool contract and the process-wide registry
//! - [`error`] — `thiserror` enums for each bounded context

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, Role, SessionId, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use tool::{Tool, ToolDefinition, ToolRegistry, ToolResult};
