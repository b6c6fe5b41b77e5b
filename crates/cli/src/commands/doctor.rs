//! `textloop doctor` — Diagnose configuration and provider reachability.

use textloop_config::AppConfig;
use textloop_core::provider::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 textloop Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `textloop config init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    match super::build_tools(&config) {
        Ok(tools) => println!("  ✅ {} tools ready: {}", tools.len(), tools.names().join(", ")),
        Err(e) => {
            println!("  ❌ Tools failed to load: {e}");
            issues += 1;
        }
    }

    match textloop_providers::build_from_config(&config) {
        Ok(provider) => {
            let (ok, line) = provider_status(provider.as_ref()).await;
            println!("{line}");
            if !ok {
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Provider not usable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Ask the provider whether it is reachable and describe the answer in one line.
async fn provider_status(provider: &dyn Provider) -> (bool, String) {
    match provider.health_check().await {
        Ok(true) => (true, format!("  ✅ Provider '{}' reachable", provider.name())),
        Ok(false) => (
            false,
            format!("  ❌ Provider '{}' rejected the request (check the API key)", provider.name()),
        ),
        Err(e) => (false, format!("  ❌ Provider '{}' unreachable: {e}", provider.name())),
    }
}
