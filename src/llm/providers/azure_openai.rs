//! Azure OpenAI style hosted provider.
//!
//! Requests go to
//! `<endpoint>/openai/deployments/<deployment>/chat/completions?api-version=<v>`
//! with the credential in an `api-key` header. The deployment selects the
//! model, so the request's model hint is not forwarded.

use std::fmt;
use std::time::Instant;

use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::chat_completions::{self, ChatCompletionRequest};
use crate::core::config::HostedConfig;
use crate::llm::{LlmRequest, LlmResponse, ProviderError};

#[derive(Clone)]
pub struct HostedProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for HostedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedProvider")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl HostedProvider {
    /// Fails with [`ProviderError::Configuration`] when endpoint, credential
    /// or deployment is missing, so a constructed provider is always usable.
    pub fn new(name: impl Into<String>, config: &HostedConfig) -> Result<Self, ProviderError> {
        let name = name.into();
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        let api_key = config.api_key.as_deref().map(str::trim).unwrap_or_default().to_string();
        let deployment = config.deployment.trim().to_string();

        let missing: Vec<&str> = [
            ("endpoint", endpoint.is_empty()),
            ("api key", api_key.is_empty()),
            ("deployment", deployment.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(ProviderError::configuration(
                &name,
                format!("configuration incomplete, missing: {}", missing.join(", ")),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::configuration(&name, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name,
            client,
            endpoint,
            api_key,
            deployment,
            api_version: config.api_version.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();
        let request_id = Uuid::now_v7();

        let payload = ChatCompletionRequest::from_request(request);
        let req = self
            .client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key);

        let completion = chat_completions::execute(&self.name, request_id, req, &payload).await?;
        let elapsed = start.elapsed();
        debug!(provider = %self.name, %request_id, elapsed_ms = elapsed.as_millis() as u64, "completion done");

        Ok(LlmResponse {
            content: completion.content,
            tokens_used: completion.tokens_used,
            response_time: Some(elapsed.as_secs_f64()),
            provider: self.name.clone(),
            model: completion.model.or_else(|| Some(self.deployment.clone())),
        })
    }

    /// Configuration check only; no network call.
    pub fn check_availability(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty() && !self.deployment.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(endpoint: &str, api_key: Option<&str>, deployment: &str) -> HostedConfig {
        HostedConfig {
            enabled: true,
            endpoint: endpoint.into(),
            api_key: api_key.map(String::from),
            deployment: deployment.into(),
            api_version: "2023-05-15".into(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn missing_credential_fails_at_construction() {
        let err = HostedProvider::new("azure_openai", &config("https://x.example", None, "gpt4"))
            .unwrap_err();
        match err {
            ProviderError::Configuration { provider, reason } => {
                assert_eq!(provider, "azure_openai");
                assert!(reason.contains("api key"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn lists_every_missing_field() {
        let err = HostedProvider::new("azure_openai", &config("", Some(" "), "")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("endpoint"));
        assert!(msg.contains("api key"));
        assert!(msg.contains("deployment"));
    }

    #[test]
    fn constructed_provider_is_available() {
        let p = HostedProvider::new("azure_openai", &config("https://x.example/", Some("k"), "gpt4"))
            .unwrap();
        assert!(p.check_availability());
        assert_eq!(
            p.completions_url(),
            "https://x.example/openai/deployments/gpt4/chat/completions"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = HostedProvider::new("azure_openai", &config("https://x.example", Some("s3cret"), "d"))
            .unwrap();
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }
}
