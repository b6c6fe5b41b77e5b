//! `textloop config` — Configuration management commands.

use textloop_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:    {}", config.default_provider);
    println!("   Model:       {}", config.default_model);
    println!("   Max steps:   {}", config.agent.max_iterations);
    println!("   Tool timeout: {}s", config.agent.tool_timeout_secs);
    println!("   Search:      {}", config.tools.search_backend);
    Ok(())
}

/// Problems that don't stop the agent from starting but probably matter.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.default_provider != "ollama" && config.api_key_for(&config.default_provider).is_none() {
        warnings.push(
            "No API key set (set TEXTLOOP_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY)".to_string(),
        );
    }

    if let Some(root) = &config.tools.file_root
        && !root.is_dir()
    {
        warnings.push(format!("tools.file_root {} is not a directory", root.display()));
    }

    if config.agent.tool_timeout_secs > 300 {
        warnings.push("agent.tool_timeout_secs is over 5 minutes".to_string());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("[REDACTED]".into());
        }
    };
    mask(&mut config.api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
    config
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
    println!("✅ Wrote default config to {}", config_path.display());
    Ok(())
}
