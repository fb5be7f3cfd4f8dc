//! `pathfinder status`: Show configuration and connectivity.

use pathfinder_assistant::AssistantPipeline;
use pathfinder_config::AppConfig;
use std::time::Duration;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let pipeline = AssistantPipeline::from_config(&config);

    println!("Pathfinder Status");
    println!("=================");
    println!("  Config dir:      {}", AppConfig::config_dir().display());
    println!("  History window:  {} messages", config.history_window);
    println!(
        "  Rate limit:      {}ms between calls ({:?})",
        config.rate_limit.min_spacing_ms, config.rate_limit.scope
    );
    println!("  Forced offline:  {}", config.force_offline);

    println!("\n  Providers (priority order):");
    let active = pipeline.provider_ids();
    for provider in config.provider_chain() {
        let state = if active.contains(&provider.id.as_str()) {
            "ready"
        } else {
            "no API key"
        };
        println!(
            "    {:<12} {:<8} {:<28} {}",
            provider.id,
            provider.priority,
            provider.model_name(),
            state
        );
    }

    if let Some(url) = &config.connectivity.probe_url {
        let reachable = pipeline
            .monitor()
            .check_now(
                &pathfinder_providers::transport::default_client(),
                url,
                Duration::from_secs(5),
            )
            .await;
        println!("\n  Probe {url}: {}", if reachable { "reachable" } else { "unreachable" });
    }
    println!(
        "  Connection:      {}",
        if pipeline.connection_status() { "online" } else { "offline" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `pathfinder onboard` first");
    }

    Ok(())
}
