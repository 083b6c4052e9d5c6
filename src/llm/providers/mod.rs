//! LLM provider implementations.
//!
//! `build_all(config)` is the factory, called once at startup.
//! Adding a new backend = new module + new entry in `build_all`.

mod chat_completions;
pub mod azure_openai;
pub mod dummy;
pub mod lm_studio;

use crate::core::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Registry name of the self-hosted provider.
pub const LM_STUDIO: &str = "lm_studio";
/// Registry name of the hosted provider.
pub const AZURE_OPENAI: &str = "azure_openai";
/// Registry name of the offline echo provider.
pub const DUMMY: &str = "dummy";

/// Result of constructing one configured provider.
pub type BuildOutcome = (String, Result<LlmProvider, ProviderError>);

/// Attempt to construct every enabled provider.
///
/// Each entry carries its own `Result`; one bad provider never prevents the
/// others from being built. Disabled sections produce no entry at all.
pub fn build_all(config: &LlmConfig) -> Vec<BuildOutcome> {
    let mut out = Vec::new();

    if config.lm_studio.enabled {
        let built = lm_studio::LocalInferenceProvider::new(LM_STUDIO, &config.lm_studio)
            .map(LlmProvider::LocalInference);
        out.push((LM_STUDIO.to_string(), built));
    }

    if config.azure_openai.enabled {
        let built = azure_openai::HostedProvider::new(AZURE_OPENAI, &config.azure_openai)
            .map(LlmProvider::Hosted);
        out.push((AZURE_OPENAI.to_string(), built));
    }

    if config.dummy.enabled {
        out.push((DUMMY.to_string(), Ok(LlmProvider::Dummy(dummy::DummyProvider::new(DUMMY)))));
    }

    out
}
