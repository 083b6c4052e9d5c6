//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the service consumes.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::time::Duration;

use crate::llm::Profile;

// ── Service ─────────────────────────────────────────────────────────────────

/// General service identity and logging settings (`[service]`).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service name reported in status output.
    pub name: String,
    pub version: String,
    /// Deployment environment label, e.g. `"development"`.
    pub environment: String,
    pub log_level: String,
    /// Optional log file (already expanded, no `~`). `None` logs to stderr.
    pub log_file: Option<PathBuf>,
}

// ── LLM ─────────────────────────────────────────────────────────────────────

/// Connection settings for a self-hosted OpenAI-compatible server
/// (`[llm.lm_studio]`).
#[derive(Debug, Clone)]
pub struct LocalInferenceConfig {
    pub enabled: bool,
    /// Server root, without the `/v1/...` suffix.
    pub base_url: String,
    /// Per-request timeout, shared with every other provider.
    pub timeout: Duration,
}

/// Connection settings for an Azure-style hosted deployment
/// (`[llm.azure_openai]`).
#[derive(Debug, Clone)]
pub struct HostedConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// From `LLM_AZURE_OPENAI_API_KEY` env only. Never sourced from TOML.
    pub api_key: Option<String>,
    pub deployment: String,
    /// Value of the `api-version` query parameter.
    pub api_version: String,
    pub timeout: Duration,
}

/// Offline echo provider (`[llm.dummy]`).
#[derive(Debug, Clone)]
pub struct DummyConfig {
    pub enabled: bool,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider used when a caller does not name one.
    pub default_provider: String,
    /// Uniform request timeout applied to every adapter.
    pub timeout: Duration,
    /// Interval between background reachability checks.
    pub health_check_interval: Duration,
    pub lm_studio: LocalInferenceConfig,
    pub azure_openai: HostedConfig,
    pub dummy: DummyConfig,
}

// ── Top-level ───────────────────────────────────────────────────────────────

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub llm: LlmConfig,
    /// Default persona used by the CLI when no profile is supplied.
    pub profile: Profile,
}

/// Environment-sourced overrides, collected once by [`super::load`].
///
/// Tests construct this directly instead of mutating process env.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub default_provider: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub lm_studio_url: Option<String>,
    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_deployment: Option<String>,
    pub azure_openai_api_key: Option<String>,
}
