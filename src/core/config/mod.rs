//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `SERVICE_LOG_LEVEL` and the `LLM_*` env overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs (`Config`, `LlmConfig`,
//!   `LocalInferenceConfig`, `HostedConfig`, …).
//! - **raw** — Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load`, `load_from`,
//!   `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// `Config` for unit tests: dummy provider only, no API keys,
    /// no external calls.
    pub fn test_default() -> Self {
        use std::time::Duration;

        let timeout = Duration::from_secs(1);
        Self {
            service: ServiceConfig {
                name: "test".into(),
                version: raw::default_version(),
                environment: "test".into(),
                log_level: "info".into(),
                log_file: None,
            },
            llm: LlmConfig {
                default_provider: "dummy".into(),
                timeout,
                health_check_interval: Duration::from_secs(60),
                lm_studio: LocalInferenceConfig {
                    enabled: false,
                    base_url: "http://127.0.0.1:0".into(),
                    timeout,
                },
                azure_openai: HostedConfig {
                    enabled: false,
                    endpoint: String::new(),
                    api_key: None,
                    deployment: String::new(),
                    api_version: raw::default_azure_api_version(),
                    timeout,
                },
                dummy: DummyConfig { enabled: true },
            },
            profile: crate::llm::Profile::new("dummy"),
        }
    }
}
