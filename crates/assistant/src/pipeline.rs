//! Assistant pipeline: connectivity check, ordered provider fallback and
//! the offline safety net.
//!
//! `send_message` is total: whatever happens on the online path, the caller
//! gets exactly one `AssistantReply`.

use futures::FutureExt;
use pathfinder_config::AppConfig;
use pathfinder_core::message::ConversationContext;
use pathfinder_core::provider::{AssistantProvider, AssistantReply};
use pathfinder_providers::{RateLimiter, build_from_config};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::network::NetworkMonitor;
use crate::offline::OfflinePatternResponder;

/// Orchestrates one reply per message.
pub struct AssistantPipeline {
    providers: Vec<Arc<dyn AssistantProvider>>,
    monitor: NetworkMonitor,
    offline: OfflinePatternResponder,
}

impl AssistantPipeline {
    /// Assemble a pipeline from parts. `providers` must already be in
    /// priority order.
    pub fn new(
        providers: Vec<Arc<dyn AssistantProvider>>,
        monitor: NetworkMonitor,
        offline: OfflinePatternResponder,
    ) -> Self {
        Self {
            providers,
            monitor,
            offline,
        }
    }

    /// Build the full pipeline from configuration: one shared rate limiter,
    /// the keyed provider chain, a monitor seeded from config and the
    /// offline responder with the configured institutions.
    pub fn from_config(config: &AppConfig) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let providers = build_from_config(config, limiter);

        let monitor = NetworkMonitor::new(config.initial_online);
        monitor.set_offline_mode(config.force_offline);

        Self::new(
            providers,
            monitor,
            OfflinePatternResponder::from_config(&config.offline),
        )
    }

    /// Produce a reply for `message`. Never fails.
    pub async fn send_message(&self, message: &str, context: &ConversationContext) -> AssistantReply {
        if !self.monitor.is_online() {
            debug!("Offline; answering from local rules");
            return self.offline.respond(message, context);
        }

        match AssertUnwindSafe(self.try_providers(message, context))
            .catch_unwind()
            .await
        {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                info!(
                    total = self.providers.len(),
                    "All providers exhausted; answering from local rules"
                );
                self.offline.respond(message, context)
            }
            Err(panic) => {
                error!(
                    panic = panic_message(panic.as_ref()),
                    "Online path panicked; answering from local rules"
                );
                self.offline
                    .respond(message, context)
                    .into_fallback(self.offline.fallback_confidence())
            }
        }
    }

    /// Walk the chain in priority order; `None` when every provider failed.
    async fn try_providers(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Option<AssistantReply> {
        for (i, provider) in self.providers.iter().enumerate() {
            info!(
                provider = %provider.id(),
                attempt = i + 1,
                total = self.providers.len(),
                "Trying provider"
            );

            match provider.attempt(message, context).await {
                Ok(reply) => return Some(reply),
                Err(e) => {
                    warn!(
                        provider = %provider.id(),
                        kind = e.kind(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }
        None
    }

    /// Force offline mode on or off.
    pub fn set_offline_mode(&self, force_offline: bool) {
        self.monitor.set_offline_mode(force_offline);
    }

    /// Whether the next message would try the remote providers.
    pub fn connection_status(&self) -> bool {
        self.monitor.is_online()
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// The monitor, for wiring a platform connectivity signal or probe.
    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    pub fn offline_responder(&self) -> &OfflinePatternResponder {
        &self.offline
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
