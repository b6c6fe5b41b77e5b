//! The ReAct agent loop for textloop.
//!
//! The agent follows a **Thought → Action → Observation** cycle over a
//! plain-text protocol:
//!
//! 1. **Prompt**: the system turn teaches the protocol and lists the tools
//! 2. **Invoke**: the model sees the whole conversation
//! 3. **Parse**: the reply becomes a final answer, a tool action, or
//!    unrecognized text
//! 4. **Act**: the tool runs under a timeout; its output is appended to the
//!    model's own turn as an `Observation:`
//! 5. **Answer**: the final text is streamed to the caller in word chunks
//!
//! The loop stops at the first answer or after `max_iterations` tool calls.

pub mod executor;
pub mod parser;
pub mod prompt;
pub mod react;
pub mod session;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use executor::{ActionExecutor, Observation};
pub use parser::{ReactStep, ResponseParser, parse_response};
pub use prompt::{PromptCache, build_system_prompt};
pub use react::{ReactAgent, ReactOutcome, StreamRun};
pub use session::Session;
pub use stream_event::{AgentEvent, AgentStep};
