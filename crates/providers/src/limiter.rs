//! Minimum spacing between outbound provider calls.
//!
//! Free-tier inference APIs enforce request quotas. Every provider waits on
//! the shared limiter before touching the network, so a burst of messages
//! turns into evenly spaced calls instead of a burst of 429s.
//!
//! Time comes from `tokio::time`, so tests drive the limiter with a paused
//! runtime clock.

use pathfinder_config::{RateLimitConfig, SpacingScope};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const GLOBAL_KEY: &str = "*";

/// Enforces `min_spacing` between permitted calls within a scope.
#[derive(Debug)]
pub struct RateLimiter {
    min_spacing: Duration,
    scope: SpacingScope,
    /// Scope key → instant the most recent call was permitted to start.
    last_permitted: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration, scope: SpacingScope) -> Self {
        Self {
            min_spacing,
            scope,
            last_permitted: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_millis(config.min_spacing_ms), config.scope)
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    pub fn scope(&self) -> SpacingScope {
        self.scope
    }

    /// Suspend until a call for `provider_id` is permitted.
    ///
    /// The first call in a scope proceeds immediately. The slot is reserved
    /// before sleeping, so concurrent waiters queue up `min_spacing` apart.
    /// A wait that is dropped mid-sleep (timeout, cancellation) still
    /// consumes its slot, and later callers queue behind it.
    /// Returns the delay that was imposed.
    pub async fn wait(&self, provider_id: &str) -> Duration {
        let key = match self.scope {
            SpacingScope::Global => GLOBAL_KEY,
            SpacingScope::PerProvider => provider_id,
        };

        let now = Instant::now();
        let permitted_at = {
            let mut slots = self.last_permitted.lock().await;
            let permitted_at = match slots.get(key) {
                Some(previous) => (*previous + self.min_spacing).max(now),
                None => now,
            };
            slots.insert(key.to_string(), permitted_at);
            permitted_at
        };

        let delay = permitted_at.saturating_duration_since(now);
        if !delay.is_zero() {
            debug!(
                provider = %provider_id,
                delay_ms = delay.as_millis() as u64,
                "Rate limiter delaying outbound call"
            );
            tokio::time::sleep_until(permitted_at).await;
        }
        delay
    }
}
