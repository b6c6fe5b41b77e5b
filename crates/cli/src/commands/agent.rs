//! `textloop agent` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;
use textloop_agent::{AgentEvent, AgentStep, ReactAgent, ReactOutcome, StreamRun};
use textloop_config::AppConfig;
use textloop_core::error::ProviderError;
use textloop_core::message::Conversation;
use tokio::io::AsyncBufReadExt;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let provider = match textloop_providers::build_from_config(&config) {
        Ok(p) => p,
        Err(ProviderError::NotConfigured(reason)) => {
            print_key_help(&reason);
            return Err("No API key found. See above for setup instructions.".into());
        }
        Err(e) => return Err(e.into()),
    };
    let tools = super::build_tools(&config)?;
    let agent = Arc::new(ReactAgent::from_config(provider, tools, &config)?);

    if let Some(msg) = message {
        // Single message mode
        let (_, outcome) = turn(&agent, agent.new_conversation(), msg).await?;
        if let ReactOutcome::Exhausted { .. } = outcome? {
            return Err("The agent stopped without an answer.".into());
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        textloop Agent — Interactive Mode      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", agent.provider_name());
    println!("  Model:     {}", agent.model());
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!("  Max steps: {}", agent.max_iterations());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = agent.new_conversation();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                conversation = agent.new_conversation();
                println!("  (conversation cleared)");
                continue;
            }
            _ => {}
        }

        println!();
        let (returned, outcome) = turn(&agent, conversation, line.to_string()).await?;
        conversation = returned;
        if let Err(e) = outcome {
            tracing::debug!(error = %e, "Turn failed");
        }
        println!();
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

/// Run one message through the agent, printing events as they arrive.
async fn turn(
    agent: &Arc<ReactAgent>,
    conversation: Conversation,
    message: String,
) -> Result<(Conversation, Result<ReactOutcome, textloop_core::Error>), Box<dyn std::error::Error>>
{
    let StreamRun { mut events, handle } = agent.run_stream(conversation, message);

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    while let Some(event) = events.recv().await {
        render(&event, &mut stdout.lock(), &mut stderr.lock())?;
    }

    Ok(handle.await?)
}

/// Answer text goes to `out`; progress and errors go to `err`.
pub fn render(event: &AgentEvent, out: &mut impl Write, err: &mut impl Write) -> std::io::Result<()> {
    match event {
        AgentEvent::AgentStep {
            step: AgentStep::Thinking,
            ..
        } => {}
        AgentEvent::AgentStep {
            step: AgentStep::Executing,
            content,
        } => writeln!(err, "  💭 {content}")?,
        AgentEvent::ToolCall {
            tool_name,
            tool_args,
            ..
        } => writeln!(err, "  🔧 {tool_name} {tool_args}")?,
        AgentEvent::ToolResult {
            tool_name, result, ..
        } => writeln!(err, "  ✅ {tool_name}: {}", first_line(result, 100))?,
        AgentEvent::ToolError {
            tool_name, error, ..
        } => writeln!(err, "  ❌ {tool_name}: {}", first_line(error, 200))?,
        AgentEvent::StreamStart => {}
        AgentEvent::StreamChunk { content } => {
            write!(out, "{content}")?;
            out.flush()?;
        }
        AgentEvent::StreamEnd => writeln!(out)?,
        AgentEvent::Error { content } => writeln!(err, "  [Error] {content}")?,
    }
    Ok(())
}

fn first_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    let cut: String = line.chars().take(max_chars).collect();
    if cut.len() < text.len() {
        format!("{cut}…")
    } else {
        cut
    }
}

fn print_key_help(reason: &str) {
    eprintln!();
    eprintln!("  ERROR: {reason}");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export OPENROUTER_API_KEY='sk-or-v1-...'   (recommended)");
    eprintln!("    export OPENAI_API_KEY='sk-...'             (for OpenAI direct)");
    eprintln!("    export TEXTLOOP_API_KEY='sk-...'           (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    eprintln!("  For a local model, set TEXTLOOP_PROVIDER=ollama instead.");
    eprintln!();
}
