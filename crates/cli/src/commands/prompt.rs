//! `textloop prompt` — Print the system prompt the model receives today.

use textloop_agent::build_system_prompt;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let tools = super::build_tools(&config)?;
    let today = chrono::Local::now().date_naive();
    println!("{}", build_system_prompt(&tools, today));
    Ok(())
}
