//! Built-in tool implementations for textloop.
//!
//! Tools give the agent the ability to interact with the world: do math,
//! search the web, keep notes and read files. Long-lived state (the search
//! cache, the note store) is created once in [`ToolStores`] and injected
//! into the tools, so every session shares it and tests can use their own.

pub mod cache;
pub mod calculator;
pub mod file_read;
pub mod notes;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use textloop_config::ToolsConfig;
use textloop_core::error::ToolError;
use textloop_core::tool::ToolRegistry;
use tracing::info;

pub use cache::TtlCache;
pub use calculator::CalculatorTool;
pub use file_read::FileReadTool;
pub use notes::{Note, NoteStore, NotesTool};
pub use web_search::{
    DuckDuckGoBackend, SearchBackend, SearchCache, SearchResult, StaticSearchBackend,
    WebSearchTool,
};

/// Process-wide state shared by the built-in tools.
#[derive(Clone)]
pub struct ToolStores {
    pub search_cache: Arc<SearchCache>,
    pub notes: Arc<NoteStore>,
}

impl ToolStores {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            search_cache: Arc::new(TtlCache::new(
                Duration::from_secs(config.search_cache_ttl_secs),
                config.search_cache_capacity,
            )),
            notes: Arc::new(NoteStore::new(config.notes_capacity)),
        }
    }
}

impl Default for ToolStores {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

/// Pick the search backend named in the configuration.
pub fn search_backend(config: &ToolsConfig) -> Arc<dyn SearchBackend> {
    match config.search_backend.as_str() {
        "duckduckgo" => Arc::new(DuckDuckGoBackend::new()),
        _ => Arc::new(StaticSearchBackend),
    }
}

/// Create the registry of built-in tools.
pub fn default_registry(
    config: &ToolsConfig,
    stores: &ToolStores,
) -> Result<ToolRegistry, ToolError> {
    let file_root = config
        .file_root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let registry = ToolRegistry::new()
        .with(Arc::new(CalculatorTool))?
        .with(Arc::new(WebSearchTool::new(
            search_backend(config),
            stores.search_cache.clone(),
        )))?
        .with(Arc::new(NotesTool::new(stores.notes.clone())))?
        .with(Arc::new(FileReadTool::new(file_root, config.max_file_bytes)))?;

    info!(
        tools = registry.len(),
        search_backend = %config.search_backend,
        "Tool registry assembled"
    );
    Ok(registry)
}
