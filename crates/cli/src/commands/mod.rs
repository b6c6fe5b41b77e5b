pub mod agent;
pub mod config_cmd;
pub mod doctor;
pub mod prompt;
pub mod tools;

use std::sync::Arc;
use textloop_config::AppConfig;
use textloop_core::tool::ToolRegistry;
use textloop_tools::ToolStores;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// The built-in tools, configured from `config`.
pub fn build_tools(config: &AppConfig) -> Result<Arc<ToolRegistry>, Box<dyn std::error::Error>> {
    let stores = ToolStores::from_config(&config.tools);
    let registry = textloop_tools::default_registry(&config.tools, &stores)?;
    Ok(Arc::new(registry))
}
