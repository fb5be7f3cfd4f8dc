pub mod ask;
pub mod assess;
pub mod chat;
pub mod onboard;
pub mod status;

use pathfinder_assistant::AssistantPipeline;
use pathfinder_config::AppConfig;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Load config and build the pipeline, honouring `--offline`.
pub fn pipeline(offline: bool) -> Result<(AppConfig, AssistantPipeline), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let pipeline = AssistantPipeline::from_config(&config);
    if offline {
        pipeline.set_offline_mode(true);
    }
    tracing::debug!(
        providers = ?pipeline.provider_ids(),
        online = pipeline.connection_status(),
        "Pipeline ready"
    );
    Ok((config, pipeline))
}

/// Start the background connectivity probe when one is configured.
pub fn start_probe(config: &AppConfig, pipeline: &AssistantPipeline) -> Option<JoinHandle<()>> {
    let url = config.connectivity.probe_url.as_ref()?;
    Some(pipeline.monitor().spawn_http_probe(
        pathfinder_providers::transport::default_client(),
        url.clone(),
        Duration::from_secs(config.connectivity.probe_interval_secs),
    ))
}
