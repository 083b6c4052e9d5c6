//! LLM subsystem — owns the provider registry and its health reporting.
//!
//! Generation goes straight through [`ProviderRegistry::resolve_and_generate`];
//! this layer adds the periodic reachability checker and the service status
//! report.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::ServiceConfig;
use crate::llm::{LlmProvider, ProviderKind, ProviderRegistry};
use crate::supervisor::health::HealthRegistry;

/// Service status as exposed to callers: per-provider availability plus the
/// list of providers that can serve requests right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub version: String,
    pub environment: String,
    /// Every configured provider, including ones that failed construction.
    pub llm_providers: BTreeMap<String, bool>,
    pub available_providers: Vec<String>,
}

pub struct LlmSubsystem {
    registry: Arc<ProviderRegistry>,
    health: Option<HealthRegistry>,
}

impl LlmSubsystem {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry, health: None }
    }

    /// Attach a health registry; one reporter per provider is written into it.
    pub fn with_health_registry(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Probe every configured provider and build the status report.
    pub async fn status(&self, service: &ServiceConfig) -> ServiceStatus {
        let available = self.registry.list_available_providers().await;
        let llm_providers = self
            .registry
            .known_providers()
            .into_iter()
            .map(|name| {
                let up = available.contains(&name);
                (name, up)
            })
            .collect();
        ServiceStatus {
            service: service.name.clone(),
            version: service.version.clone(),
            environment: service.environment.clone(),
            llm_providers,
            available_providers: available.into_iter().collect(),
        }
    }

    /// Spawn a background task that probes every provider periodically.
    ///
    /// The task stops when `shutdown` is cancelled. Returns `None` if no
    /// health registry is attached.
    pub fn spawn_health_checker(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let health = self.health.clone()?;
        let registry = Arc::clone(&self.registry);
        Some(tokio::spawn(async move {
            // Run an immediate check on startup.
            Self::run_check(&registry, &health).await;
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the first (immediate) tick
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => Self::run_check(&registry, &health).await,
                }
            }
            debug!("llm health checker stopped");
        }))
    }

    /// Wait for a checker spawned by [`Self::spawn_health_checker`].
    ///
    /// Returns `false` if the task panicked or was aborted.
    pub async fn join_health_checker(handle: JoinHandle<()>) -> bool {
        match handle.await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "llm health checker ended abnormally");
                false
            }
        }
    }

    /// Write one round of provider states into `health`.
    pub async fn run_check(registry: &ProviderRegistry, health: &HealthRegistry) {
        for (name, err) in registry.startup_failures() {
            health
                .reporter(name.as_str())
                .report_down(format!("not registered: {err}"), None)
                .await;
        }

        for provider in registry.providers() {
            let reporter = health.reporter(provider.name());
            let kind = Some(kind_label(provider));
            if provider.check_availability().await {
                debug!(provider = provider.name(), "llm provider reachable");
                reporter.report_up(kind).await;
            } else {
                warn!(provider = provider.name(), "llm provider unreachable");
                reporter.report_down("provider unreachable", kind).await;
            }
        }
    }
}

fn kind_label(provider: &LlmProvider) -> &'static str {
    match provider.kind() {
        ProviderKind::Dummy => "dummy",
        ProviderKind::LocalInference => "local",
        ProviderKind::Hosted => "hosted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn subsystem_with_failure() -> (LlmSubsystem, Config) {
        let mut cfg = Config::test_default();
        cfg.llm.azure_openai.enabled = true;
        let registry = Arc::new(ProviderRegistry::from_config(&cfg.llm));
        (LlmSubsystem::new(registry), cfg)
    }

    #[tokio::test]
    async fn status_lists_failed_providers_as_unavailable() {
        let (llm, cfg) = subsystem_with_failure();
        let status = llm.status(&cfg.service).await;

        assert_eq!(status.service, "test");
        assert_eq!(status.llm_providers.get("dummy"), Some(&true));
        assert_eq!(status.llm_providers.get("azure_openai"), Some(&false));
        assert_eq!(status.available_providers, vec!["dummy".to_string()]);
    }

    #[tokio::test]
    async fn status_serializes_like_the_status_endpoint() {
        let (llm, cfg) = subsystem_with_failure();
        let json = serde_json::to_value(llm.status(&cfg.service).await).unwrap();
        assert_eq!(json["llm_providers"]["azure_openai"], false);
        assert_eq!(json["available_providers"], serde_json::json!(["dummy"]));
    }

    #[tokio::test]
    async fn run_check_reports_every_known_provider() {
        let (llm, _) = subsystem_with_failure();
        let health = HealthRegistry::new();
        LlmSubsystem::run_check(llm.registry(), &health).await;

        let snapshot = health.snapshot().await;
        let names: Vec<_> = snapshot.iter().map(|h| h.provider.as_str()).collect();
        assert_eq!(names, vec!["azure_openai", "dummy"]);
        assert!(!snapshot[0].up);
        assert_eq!(snapshot[0].kind, None);
        assert!(snapshot[1].up);
        assert_eq!(snapshot[1].kind, Some("dummy"));
        assert_eq!(health.summary().await, (1, 2));
    }

    #[tokio::test]
    async fn health_checker_needs_registry_and_stops_on_cancel() {
        let (llm, _) = subsystem_with_failure();
        let token = CancellationToken::new();
        assert!(llm.spawn_health_checker(Duration::from_secs(60), token.clone()).is_none());

        let health = HealthRegistry::new();
        let llm = llm.with_health_registry(health.clone());
        let handle = llm
            .spawn_health_checker(Duration::from_secs(60), token.clone())
            .unwrap();
        token.cancel();
        assert!(LlmSubsystem::join_health_checker(handle).await);

        // The startup check always runs before the loop observes cancellation.
        assert_eq!(health.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn panicked_checker_is_reported_not_propagated() {
        let handle = tokio::spawn(async { panic!("checker blew up") });
        assert!(!LlmSubsystem::join_health_checker(handle).await);
    }
}
