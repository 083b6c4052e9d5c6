//! Persona descriptor consumed by the dispatcher.
//!
//! Profiles are owned and persisted elsewhere; the dispatcher only reads the
//! provider choice and generation defaults from them.

use serde::{Deserialize, Serialize};

use super::ProviderError;

/// Temperature used when a profile does not specify one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// `max_tokens` used when a profile does not specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
/// Upper bound accepted for a profile's `max_tokens`.
pub const MAX_TOKENS_LIMIT: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Registry key of the provider this persona talks to.
    pub provider_name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_instructions: Option<String>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Profile {
    /// A profile with default generation parameters and no instructions.
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_instructions: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Parse a temperature stored as text (e.g. `"0.7"`).
    pub fn parse_temperature(raw: &str) -> Result<f32, ProviderError> {
        raw.trim()
            .parse::<f32>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| ProviderError::InvalidRequest(format!("invalid temperature '{raw}'")))
    }

    /// Check the descriptor before it is used for dispatch.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.provider_name.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("provider name must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::InvalidRequest(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
            return Err(ProviderError::InvalidRequest(format!(
                "max_tokens {} outside 1..={MAX_TOKENS_LIMIT}",
                self.max_tokens
            )));
        }
        Ok(())
    }
}
