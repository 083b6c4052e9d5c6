//! Dummy LLM provider — echoes the last user message back prefixed with `[echo]`.
//! Used for exercising the full dispatch path without a model server.

use std::time::Instant;

use crate::llm::{LlmRequest, LlmResponse, ProviderError, Role};

#[derive(Debug, Clone)]
pub struct DummyProvider {
    name: String,
}

impl DummyProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();
        let last_user = request
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(LlmResponse {
            content: format!("[echo] {last_user}"),
            tokens_used: None,
            response_time: Some(start.elapsed().as_secs_f64()),
            provider: self.name.clone(),
            model: Some("echo".into()),
        })
    }

    /// Always available.
    pub fn check_availability(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[tokio::test]
    async fn echoes_last_user_message() {
        let p = DummyProvider::new("dummy");
        let req = LlmRequest::new(
            vec![ChatMessage::user("first"), ChatMessage::assistant("a"), ChatMessage::user("hello")],
            0.7,
            10,
            Some("ignored".into()),
        )
        .unwrap();
        assert_eq!(p.generate(&req).await.unwrap().content, "[echo] hello");
    }

    #[tokio::test]
    async fn no_user_message_echoes_empty() {
        let p = DummyProvider::new("dummy");
        let req = LlmRequest::new(vec![ChatMessage::assistant("a")], 0.7, 10, None).unwrap();
        assert_eq!(p.generate(&req).await.unwrap().content, "[echo] ");
    }
}
