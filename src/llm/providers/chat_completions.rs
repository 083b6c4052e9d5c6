//! Shared `/chat/completions` wire format.
//!
//! Both HTTP adapters speak the OpenAI chat-completions shape and differ only
//! in URL layout, auth header, and a couple of body fields. The wire types
//! stay private to `providers/`; callers only see `LlmRequest`/`LlmResponse`.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};
use uuid::Uuid;

use crate::llm::{ChatMessage, LlmRequest, ProviderError};

/// Range every adapter clamps temperature into before sending.
pub(super) const TEMPERATURE_MIN: f32 = 0.0;
pub(super) const TEMPERATURE_MAX: f32 = 2.0;

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn from_request(request: &'a LlmRequest) -> Self {
        Self {
            model: None,
            messages: request.outgoing_messages(),
            temperature: request.temperature().clamp(TEMPERATURE_MIN, TEMPERATURE_MAX),
            max_tokens: request.max_tokens(),
            stream: None,
        }
    }

    pub fn with_model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Fields extracted from a successful completion payload.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Completion {
    pub content: String,
    pub tokens_used: Option<u64>,
    pub model: Option<String>,
}

/// Send a prepared request and normalize the reply.
///
/// Transport failures and non-2xx statuses become [`ProviderError::Request`];
/// a body that does not match the chat-completions shape becomes
/// [`ProviderError::Response`].
pub(super) async fn execute(
    provider: &str,
    request_id: Uuid,
    req: reqwest::RequestBuilder,
    payload: &ChatCompletionRequest<'_>,
) -> Result<Completion, ProviderError> {
    debug!(
        provider,
        %request_id,
        messages = payload.messages.len(),
        temperature = payload.temperature,
        max_tokens = payload.max_tokens,
        "sending LLM request"
    );
    if tracing::enabled!(tracing::Level::TRACE) {
        let json = serde_json::to_string_pretty(payload)
            .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
        trace!(provider, %request_id, payload = %json, "full LLM request payload");
    }

    let response = req.json(payload).send().await.map_err(|e| {
        error!(provider, %request_id, error = %e, timeout = e.is_timeout(), "LLM HTTP request failed (transport)");
        transport_error(provider, e)
    })?;

    let response = check_status(provider, response).await?;

    let body = response.text().await.map_err(|e| {
        error!(provider, %request_id, error = %e, "failed to read LLM response body");
        transport_error(provider, e)
    })?;

    let completion = parse_completion(provider, &body)?;
    debug!(
        provider,
        %request_id,
        tokens_used = ?completion.tokens_used,
        model = ?completion.model,
        "received LLM response"
    );
    Ok(completion)
}

/// Extract the first choice's text plus optional usage and model fields.
pub(super) fn parse_completion(provider: &str, body: &str) -> Result<Completion, ProviderError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        error!(provider, error = %e, "failed to deserialize LLM response");
        ProviderError::response(provider, format!("failed to parse response body: {e}"))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::response(provider, "response contains no choices"))?
        .message
        .content
        .ok_or_else(|| ProviderError::response(provider, "missing content in first choice"))?;

    Ok(Completion {
        content,
        tokens_used: parsed.usage.and_then(|u| u.total_tokens),
        model: parsed.model,
    })
}

fn transport_error(provider: &str, e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        format!("timed out: {e}")
    } else {
        e.to_string()
    };
    ProviderError::Request {
        provider: provider.to_string(),
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}

/// Return the response if successful, or a structured error built from its body.
async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(provider, %status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request {
        provider: provider.to_string(),
        status: Some(status.as_u16()),
        message,
    })
}
