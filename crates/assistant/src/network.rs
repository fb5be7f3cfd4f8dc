//! Connectivity tracking.
//!
//! The monitor caches the last known "are we online?" value. A single
//! writer (the platform signal, or the HTTP probe) updates it; the pipeline
//! only reads. Unknown connectivity counts as online: a failed provider call
//! is a better signal than a stale flag, and the pipeline falls back on
//! failure anyway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Shortest polling period; a zero interval would panic the ticker.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct MonitorState {
    online: AtomicBool,
    forced_offline: AtomicBool,
}

/// Shared, lock-free connectivity flag. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    state: Arc<MonitorState>,
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkMonitor {
    /// Create a monitor with the value assumed before the first signal.
    pub fn new(initial_online: bool) -> Self {
        Self {
            state: Arc::new(MonitorState {
                online: AtomicBool::new(initial_online),
                forced_offline: AtomicBool::new(false),
            }),
        }
    }

    /// Last known connectivity, after the operator override.
    pub fn is_online(&self) -> bool {
        !self.state.forced_offline.load(Ordering::Relaxed) && self.state.online.load(Ordering::Relaxed)
    }

    /// Record a connectivity change from the platform signal.
    pub fn set_online(&self, online: bool) {
        let previous = self.state.online.swap(online, Ordering::Relaxed);
        if previous != online {
            info!(online, "Connectivity changed");
        }
    }

    /// Connectivity could not be determined; assume online.
    pub fn set_unknown(&self) {
        self.set_online(true);
    }

    /// Apply a platform signal where `None` means unknown.
    pub fn apply_signal(&self, signal: Option<bool>) {
        match signal {
            Some(online) => self.set_online(online),
            None => self.set_unknown(),
        }
    }

    /// Force offline mode on or off regardless of the real signal.
    pub fn set_offline_mode(&self, force_offline: bool) {
        let previous = self.state.forced_offline.swap(force_offline, Ordering::Relaxed);
        if previous != force_offline {
            info!(force_offline, "Offline mode override changed");
        }
    }

    pub fn is_forced_offline(&self) -> bool {
        self.state.forced_offline.load(Ordering::Relaxed)
    }

    /// Follow a platform connectivity stream until its sender is dropped.
    pub fn follow(&self, mut signal: watch::Receiver<Option<bool>>) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.apply_signal(*signal.borrow_and_update());
            while signal.changed().await.is_ok() {
                let value = *signal.borrow_and_update();
                monitor.apply_signal(value);
            }
            debug!("Connectivity signal closed; keeping last known state");
        })
    }

    /// Poll `url` every `interval`; any HTTP response means online, a
    /// transport error or timeout means offline.
    ///
    /// The task runs until the returned handle is aborted. Intervals below
    /// 50ms are raised to 50ms.
    pub fn spawn_http_probe(
        &self,
        client: reqwest::Client,
        url: impl Into<String>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let monitor = self.clone();
        let url = url.into();
        let interval = interval.max(MIN_POLL_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reachable = probe(&client, &url, interval.min(Duration::from_secs(10))).await;
                monitor.set_online(reachable);
            }
        })
    }

    /// Probe `url` once and record the result.
    pub async fn check_now(&self, client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
        let reachable = probe(client, url, timeout).await;
        self.set_online(reachable);
        reachable
    }
}

async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let reachable = client.head(url).timeout(timeout).send().await.is_ok();
    debug!(url = %url, reachable, "Connectivity probe");
    reachable
}
