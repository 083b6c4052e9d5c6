//! Provider registry and dispatcher.
//!
//! Built once per process from configuration and read-only afterwards, so it
//! can be shared behind an `Arc` with no locking. Providers whose
//! construction failed are left out and remembered for diagnostics.

use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::providers::{self, BuildOutcome};
use super::{ChatMessage, LlmProvider, LlmRequest, LlmResponse, Profile, ProviderError};
use crate::core::config::LlmConfig;

#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, LlmProvider>,
    failures: Vec<(String, ProviderError)>,
}

impl ProviderRegistry {
    /// Build every enabled provider from `config`.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::from_outcomes(providers::build_all(config))
    }

    /// Keep the successful outcomes and record the failures.
    ///
    /// Names are unique: a second provider under an already-registered name
    /// is recorded as a configuration failure.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = BuildOutcome>) -> Self {
        let mut registry = Self::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(provider) => registry.insert(name, provider),
                Err(e) => {
                    warn!(provider = %name, error = %e, "llm provider not registered");
                    registry.failures.push((name, e));
                }
            }
        }
        info!(
            registered = ?registry.providers.keys().collect::<Vec<_>>(),
            failed = registry.failures.len(),
            "llm provider registry ready"
        );
        registry
    }

    /// Add a constructed provider under its own name.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        let name = provider.name().to_string();
        self.insert(name, provider);
        self
    }

    fn insert(&mut self, name: String, provider: LlmProvider) {
        if self.providers.contains_key(&name) {
            warn!(provider = %name, "duplicate llm provider name ignored");
            let e = ProviderError::configuration(&name, "duplicate provider name");
            self.failures.push((name, e));
            return;
        }
        debug!(provider = %name, kind = ?provider.kind(), "llm provider registered");
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<&LlmProvider> {
        self.providers.get(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Registered providers, in name order.
    pub fn providers(&self) -> impl Iterator<Item = &LlmProvider> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers that were configured but could not be constructed.
    pub fn startup_failures(&self) -> &[(String, ProviderError)] {
        &self.failures
    }

    /// Registered names plus names that failed construction.
    pub fn known_providers(&self) -> BTreeSet<String> {
        self.providers
            .keys()
            .cloned()
            .chain(self.failures.iter().map(|(n, _)| n.clone()))
            .collect()
    }

    /// Resolve `profile.provider_name`, apply overrides, gate on
    /// availability, and run one generate call.
    ///
    /// An invalid request is rejected before the provider is probed.
    ///
    /// Overrides take precedence over the profile's defaults. Errors from the
    /// adapter are returned unchanged.
    pub async fn resolve_and_generate(
        &self,
        messages: Vec<ChatMessage>,
        profile: &Profile,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<LlmResponse, ProviderError> {
        let name = profile.provider_name.as_str();
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        let temperature = temperature.unwrap_or(profile.temperature);
        let max_tokens = max_tokens.unwrap_or(profile.max_tokens);
        let request = LlmRequest::new(
            messages,
            temperature,
            max_tokens,
            profile.system_instructions.clone(),
        )?
        .with_model(profile.model.clone());

        if !provider.check_availability().await {
            warn!(provider = name, "llm provider unavailable, generation skipped");
            return Err(ProviderError::Unavailable(name.to_string()));
        }

        provider.generate(&request).await
    }

    /// Names of every registered provider whose probe currently succeeds.
    ///
    /// Probes run concurrently and are never cached.
    pub async fn list_available_providers(&self) -> BTreeSet<String> {
        let probes = self.providers.iter().map(|(name, provider)| async move {
            provider.check_availability().await.then(|| name.clone())
        });
        join_all(probes).await.into_iter().flatten().collect()
    }

    /// `false` for unregistered names; otherwise the provider's own probe.
    pub async fn is_provider_available(&self, name: &str) -> bool {
        match self.providers.get(name) {
            Some(provider) => provider.check_availability().await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::llm::providers::{DUMMY, dummy::DummyProvider};

    fn dummy_registry() -> ProviderRegistry {
        ProviderRegistry::default().with_provider(LlmProvider::Dummy(DummyProvider::new(DUMMY)))
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let registry = dummy_registry();
        let err = registry
            .resolve_and_generate(vec![ChatMessage::user("hi")], &Profile::new("ghost"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(ref n) if n == "ghost"));
    }

    #[tokio::test]
    async fn dispatches_to_named_provider() {
        let registry = dummy_registry();
        let resp = registry
            .resolve_and_generate(vec![ChatMessage::user("hi")], &Profile::new(DUMMY), None, None)
            .await
            .unwrap();
        assert_eq!(resp.provider, DUMMY);
        assert_eq!(resp.content, "[echo] hi");
    }

    #[tokio::test]
    async fn empty_messages_rejected_after_resolution() {
        let registry = dummy_registry();
        let err = registry
            .resolve_and_generate(Vec::new(), &Profile::new(DUMMY), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_names_recorded_as_failure() {
        let registry = dummy_registry().with_provider(LlmProvider::Dummy(DummyProvider::new(DUMMY)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.startup_failures().len(), 1);
    }

    #[tokio::test]
    async fn failed_construction_is_excluded_but_known() {
        let mut cfg = Config::test_default();
        cfg.llm.azure_openai.enabled = true;
        let registry = ProviderRegistry::from_config(&cfg.llm);

        assert!(registry.get("azure_openai").is_none());
        assert_eq!(registry.startup_failures().len(), 1);
        assert!(registry.known_providers().contains("azure_openai"));
        assert!(!registry.is_provider_available("azure_openai").await);
        assert_eq!(
            registry.list_available_providers().await,
            BTreeSet::from([DUMMY.to_string()])
        );
    }

    #[tokio::test]
    async fn unregistered_name_is_unavailable() {
        assert!(!dummy_registry().is_provider_available("nope").await);
        assert!(dummy_registry().is_provider_available(DUMMY).await);
    }
}
