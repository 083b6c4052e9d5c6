//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are immutable after construction; clone them freely.
//! Both capabilities (`generate`, `check_availability`) are `async fn` on the
//! enum so callers need no trait-object machinery.

pub mod profile;
pub mod providers;
pub mod registry;
pub mod request;

use thiserror::Error;

pub use profile::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, MAX_TOKENS_LIMIT, Profile};
pub use registry::ProviderRegistry;
pub use request::{ChatMessage, LlmRequest, LlmResponse, Role};

// ── Error ─────────────────────────────────────────────────────────────────────

/// Every failure the LLM layer can report.
///
/// Variants carry the provider name so callers can tell configuration
/// problems apart from transient outages without string matching.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The adapter could not be constructed from its settings.
    #[error("llm provider '{provider}' is misconfigured: {reason}")]
    Configuration { provider: String, reason: String },

    #[error("llm provider '{0}' is not registered")]
    NotFound(String),

    /// Registered, but its liveness probe currently fails.
    #[error("llm provider '{0}' is not available")]
    Unavailable(String),

    /// Transport failure, timeout, or non-2xx status.
    #[error("{provider} request failed: {message}")]
    Request {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// The call succeeded but the payload could not be normalized.
    #[error("{provider} returned an unusable response: {message}")]
    Response { provider: String, message: String },

    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Name of the provider the error originated from, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            ProviderError::Configuration { provider, .. }
            | ProviderError::Request { provider, .. }
            | ProviderError::Response { provider, .. } => Some(provider),
            ProviderError::NotFound(name) | ProviderError::Unavailable(name) => Some(name),
            ProviderError::InvalidRequest(_) => None,
        }
    }

    pub(crate) fn configuration(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::Configuration { provider: provider.to_string(), reason: reason.into() }
    }

    pub(crate) fn response(provider: &str, message: impl Into<String>) -> Self {
        ProviderError::Response { provider: provider.to_string(), message: message.into() }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// Backend family of a provider, independent of its registry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Dummy,
    LocalInference,
    Hosted,
}

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    LocalInference(providers::lm_studio::LocalInferenceProvider),
    Hosted(providers::azure_openai::HostedProvider),
}

impl LlmProvider {
    /// Registry name; also stamped on every [`LlmResponse`] this provider returns.
    pub fn name(&self) -> &str {
        match self {
            LlmProvider::Dummy(p) => p.name(),
            LlmProvider::LocalInference(p) => p.name(),
            LlmProvider::Hosted(p) => p.name(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            LlmProvider::Dummy(_) => ProviderKind::Dummy,
            LlmProvider::LocalInference(_) => ProviderKind::LocalInference,
            LlmProvider::Hosted(_) => ProviderKind::Hosted,
        }
    }

    /// Run one completion round-trip. Never retries.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.generate(request).await,
            LlmProvider::LocalInference(p) => p.generate(request).await,
            LlmProvider::Hosted(p) => p.generate(request).await,
        }
    }

    /// Liveness probe. Never fails: any error degrades to `false`.
    pub async fn check_availability(&self) -> bool {
        match self {
            LlmProvider::Dummy(p) => p.check_availability(),
            LlmProvider::LocalInference(p) => p.check_availability().await,
            LlmProvider::Hosted(p) => p.check_availability(),
        }
    }
}
