//! Builds the priority-ordered provider chain from configuration.

use pathfinder_config::{AppConfig, ProviderConfig, ProviderKind};
use pathfinder_core::prompt::PromptContextBuilder;
use pathfinder_core::provider::{AssistantProvider, ProviderDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::gemini::GeminiProvider;
use crate::limiter::RateLimiter;
use crate::openai_compat::OpenAiCompatProvider;
use crate::transport::default_client;

/// Describe one configured provider.
pub fn descriptor_from_config(config: &ProviderConfig, min_spacing: Duration) -> ProviderDescriptor {
    ProviderDescriptor {
        id: config.id.clone(),
        priority: config.priority,
        endpoint: config.base_url(),
        auth_token: config.resolved_api_key(),
        model: config.model_name(),
        request_timeout: Duration::from_secs(config.timeout_secs),
        min_spacing,
        confidence: config.confidence,
    }
}

/// Build the provider chain in priority order.
///
/// Disabled providers and providers without an API key are left out; an
/// empty chain is valid and means every reply comes from the offline
/// responder.
pub fn build_from_config(
    config: &AppConfig,
    limiter: Arc<RateLimiter>,
) -> Vec<Arc<dyn AssistantProvider>> {
    let prompt = PromptContextBuilder::new(config.history_window);
    let client = default_client();
    let mut chain: Vec<Arc<dyn AssistantProvider>> = Vec::new();

    for provider_config in config.provider_chain() {
        let descriptor = descriptor_from_config(provider_config, limiter.min_spacing());
        if descriptor.auth_token.is_none() {
            warn!(
                provider = %provider_config.id,
                env = provider_config.api_key_env.as_deref().unwrap_or("-"),
                "No API key configured; provider left out of the chain"
            );
            continue;
        }

        let provider: Arc<dyn AssistantProvider> = match provider_config.kind {
            ProviderKind::OpenaiCompat => Arc::new(
                OpenAiCompatProvider::new(descriptor, prompt, limiter.clone())
                    .with_client(client.clone())
                    .with_sampling(provider_config.temperature, provider_config.max_tokens),
            ),
            ProviderKind::Gemini => Arc::new(
                GeminiProvider::new(descriptor, prompt, limiter.clone())
                    .with_client(client.clone())
                    .with_sampling(provider_config.temperature, provider_config.max_tokens),
            ),
        };
        chain.push(provider);
    }

    info!(
        providers = ?chain.iter().map(|p| p.id().to_string()).collect::<Vec<_>>(),
        "Provider chain built"
    );
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_config::SpacingScope;

    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(Duration::from_millis(1000), SpacingScope::Global))
    }

    #[test]
    fn default_config_without_keys_builds_empty_chain() {
        let chain = build_from_config(&AppConfig::default(), limiter());
        assert!(chain.is_empty());
    }

    #[test]
    fn keyed_providers_follow_priority() {
        let mut config = AppConfig::default();
        config.providers[0].api_key = Some("gsk".into());
        config.providers[1].api_key = Some("gem".into());
        config.providers[0].priority = 9;

        let chain = build_from_config(&config, limiter());
        let ids: Vec<&str> = chain.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["provider_b", "provider_a"]);
    }

    #[test]
    fn disabled_provider_is_skipped() {
        let mut config = AppConfig::default();
        config.providers[0].api_key = Some("gsk".into());
        config.providers[1].api_key = Some("gem".into());
        config.providers[0].enabled = false;

        let chain = build_from_config(&config, limiter());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id(), "provider_b");
    }

    #[test]
    fn descriptor_carries_config_values() {
        let mut config = AppConfig::default();
        config.providers[1].api_key = Some("gem".into());
        config.providers[1].api_url = Some("https://proxy.example/v1beta/".into());
        let descriptor = descriptor_from_config(&config.providers[1], Duration::from_millis(750));

        assert_eq!(descriptor.id, "provider_b");
        assert_eq!(descriptor.endpoint, "https://proxy.example/v1beta");
        assert_eq!(descriptor.request_timeout, Duration::from_secs(20));
        assert_eq!(descriptor.min_spacing, Duration::from_millis(750));
        assert_eq!(descriptor.model, "gemini-1.5-flash");
        assert!((descriptor.confidence - 0.92).abs() < f32::EPSILON);
    }
}
