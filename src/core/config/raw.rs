//! Raw TOML shape — `serde` targets before resolution.
//!
//! Every section is optional; missing keys fall back to the `default_*`
//! helpers below so a bare file (or no file at all) still resolves.

use serde::Deserialize;

#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub service: RawService,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub profile: RawProfile,
}

#[derive(Deserialize)]
pub(super) struct RawService {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawService {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_version(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_health_check_interval_seconds")]
    pub health_check_interval_seconds: u64,
    #[serde(default)]
    pub lm_studio: RawLmStudio,
    #[serde(default)]
    pub azure_openai: RawAzureOpenAi,
    #[serde(default)]
    pub dummy: RawDummy,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            timeout_seconds: default_timeout_seconds(),
            health_check_interval_seconds: default_health_check_interval_seconds(),
            lm_studio: RawLmStudio::default(),
            azure_openai: RawAzureOpenAi::default(),
            dummy: RawDummy::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawLmStudio {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lm_studio_url")]
    pub url: String,
}

impl Default for RawLmStudio {
    fn default() -> Self {
        Self { enabled: true, url: default_lm_studio_url() }
    }
}

/// `api_key` is deliberately absent: it only comes from the environment.
#[derive(Deserialize)]
pub(super) struct RawAzureOpenAi {
    /// Defaults to `true`: construction is attempted and a missing setting
    /// simply leaves the provider out of the registry.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
}

impl Default for RawAzureOpenAi {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_azure_api_version(),
        }
    }
}

#[derive(Deserialize, Default)]
pub(super) struct RawDummy {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize)]
pub(super) struct RawProfile {
    /// Falls back to `llm.default`.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Accepts either a number or the textual form (`"0.7"`).
    #[serde(default)]
    pub temperature: Option<toml::Value>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_instructions: Option<String>,
}

impl Default for RawProfile {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            temperature: None,
            max_tokens: default_max_tokens(),
            system_instructions: None,
        }
    }
}

pub(super) fn default_service_name() -> String { "chatbot-service".to_string() }
pub(super) fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
pub(super) fn default_environment() -> String { "development".to_string() }
pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_llm_provider() -> String { "lm_studio".to_string() }
pub(super) fn default_timeout_seconds() -> u64 { 30 }
pub(super) fn default_health_check_interval_seconds() -> u64 { 60 }
pub(super) fn default_lm_studio_url() -> String { "http://localhost:3001".to_string() }
pub(super) fn default_azure_api_version() -> String { "2023-05-15".to_string() }
pub(super) fn default_max_tokens() -> u32 { 1000 }

fn default_true() -> bool {
    true
}
