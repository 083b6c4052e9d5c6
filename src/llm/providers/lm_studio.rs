//! Self-hosted OpenAI-compatible provider (LM Studio, llama.cpp server, …).
//!
//! Talks to `<base_url>/v1/chat/completions` with no authentication and
//! probes `<base_url>/v1/models` for liveness.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::debug;
use uuid::Uuid;

use super::chat_completions::{self, ChatCompletionRequest};
use crate::core::config::LocalInferenceConfig;
use crate::llm::{LlmRequest, LlmResponse, ProviderError};

/// Fixed bound on the liveness probe, independent of the request timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct LocalInferenceProvider {
    name: String,
    client: Client,
    probe_client: Client,
    base_url: String,
}

impl LocalInferenceProvider {
    pub fn new(name: impl Into<String>, config: &LocalInferenceConfig) -> Result<Self, ProviderError> {
        let name = name.into();
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ProviderError::configuration(&name, "base URL is empty"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::configuration(&name, format!("failed to build HTTP client: {e}")))?;
        let probe_client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::configuration(&name, format!("failed to build probe client: {e}")))?;

        Ok(Self { name, client, probe_client, base_url })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();
        let request_id = Uuid::now_v7();

        let payload = ChatCompletionRequest::from_request(request)
            .with_model(request.model())
            .with_stream(false);
        let req = self.client.post(format!("{}/v1/chat/completions", self.base_url));

        let completion = chat_completions::execute(&self.name, request_id, req, &payload).await?;
        let elapsed = start.elapsed();
        debug!(provider = %self.name, %request_id, elapsed_ms = elapsed.as_millis() as u64, "completion done");

        Ok(LlmResponse {
            content: completion.content,
            tokens_used: completion.tokens_used,
            response_time: Some(elapsed.as_secs_f64()),
            provider: self.name.clone(),
            model: completion.model,
        })
    }

    /// `true` only when `GET /v1/models` answers 200 within [`PROBE_TIMEOUT`].
    pub async fn check_availability(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self.probe_client.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status() == StatusCode::OK;
                if !ok {
                    debug!(provider = %self.name, status = %resp.status(), "liveness probe returned non-200");
                }
                ok
            }
            Err(e) => {
                debug!(provider = %self.name, error = %e, "liveness probe failed");
                false
            }
        }
    }
}
