//! Last-known provider health.
//!
//! The LLM subsystem's background checker probes each provider and writes
//! the outcome through a [`HealthReporter`]. Readers take a
//! [`HealthRegistry::snapshot`] and never trigger a probe themselves.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Outcome of the most recent check of one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHealth {
    /// Registry name of the provider.
    pub provider: String,
    pub up: bool,
    pub message: String,
    /// `"local"`, `"hosted"` or `"dummy"`; `None` when construction failed.
    pub kind: Option<&'static str>,
}

/// Shared map of provider name to its last reported state.
#[derive(Clone, Default)]
pub struct HealthRegistry {
    states: Arc<RwLock<BTreeMap<String, ProviderHealth>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write handle for one provider.
    pub fn reporter(&self, provider: impl Into<String>) -> HealthReporter {
        HealthReporter { provider: provider.into(), states: Arc::clone(&self.states) }
    }

    /// Every reported provider, in name order.
    pub async fn snapshot(&self) -> Vec<ProviderHealth> {
        self.states.read().await.values().cloned().collect()
    }

    /// `(up, reported)` counts for a one-line summary.
    pub async fn summary(&self) -> (usize, usize) {
        let states = self.states.read().await;
        (states.values().filter(|h| h.up).count(), states.len())
    }
}

#[derive(Clone)]
pub struct HealthReporter {
    provider: String,
    states: Arc<RwLock<BTreeMap<String, ProviderHealth>>>,
}

impl HealthReporter {
    pub async fn report_up(&self, kind: Option<&'static str>) {
        self.write(true, "ok".into(), kind).await;
    }

    pub async fn report_down(&self, message: impl Into<String>, kind: Option<&'static str>) {
        self.write(false, message.into(), kind).await;
    }

    async fn write(&self, up: bool, message: String, kind: Option<&'static str>) {
        let state = ProviderHealth { provider: self.provider.clone(), up, message, kind };
        self.states.write().await.insert(self.provider.clone(), state);
    }
}
