//! Provider-neutral request and response types.
//!
//! Adapters translate [`LlmRequest`] into their own wire format and hand
//! back an [`LlmResponse`]; nothing outside `providers/` sees wire types.

use serde::{Deserialize, Serialize};

use super::ProviderError;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A normalized generate request.
///
/// Always holds at least one message and a non-zero `max_tokens`; both are
/// checked by [`LlmRequest::new`]. Fields are read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    system_instructions: Option<String>,
    model: Option<String>,
}

impl LlmRequest {
    pub fn new(
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
        system_instructions: Option<String>,
    ) -> Result<Self, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::InvalidRequest("at least one message is required".into()));
        }
        if max_tokens == 0 {
            return Err(ProviderError::InvalidRequest("max_tokens must be positive".into()));
        }
        if !temperature.is_finite() {
            return Err(ProviderError::InvalidRequest(format!(
                "temperature must be a finite number, got {temperature}"
            )));
        }
        let system_instructions = system_instructions.filter(|s| !s.trim().is_empty());
        Ok(Self { messages, temperature, max_tokens, system_instructions, model: None })
    }

    /// Attach a model hint. Providers that select the model elsewhere
    /// (e.g. by deployment) ignore it.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn system_instructions(&self) -> Option<&str> {
        self.system_instructions.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The sequence actually sent upstream: a synthetic system message
    /// built from `system_instructions` (if any), then the caller's
    /// messages in their original order.
    pub fn outgoing_messages(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(sys) = &self.system_instructions {
            out.push(ChatMessage::system(sys.clone()));
        }
        out.extend(self.messages.iter().cloned());
        out
    }
}

/// A normalized generate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Wall-clock seconds from request start to parsed reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
