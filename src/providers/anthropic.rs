use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::error::ProviderError;
use crate::core::message::{ChatRole, TokenUsage};
use crate::core::provider::{CompletionRequest, CompletionResponse, Provider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 8000;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn send_once(
        &self,
        body: &serde_json::Value,
    ) -> Result<CompletionResponse, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            let json: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
            return parse_response(&json);
        }

        let retry_after_ms = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let text = resp.text().await.unwrap_or_default();

        Err(classify_status(status, retry_after_ms, &text))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = build_body(request);
        let timeout_secs = self.timeout.as_secs();

        let attempts = async {
            let mut last_err = ProviderError::Http("no attempts made".into());

            for attempt in 0..MAX_ATTEMPTS {
                if attempt > 0 {
                    let backoff = compute_backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        backoff_ms = backoff,
                        error = %last_err,
                        "retrying completion request"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }

                match self.send_once(&body).await {
                    Ok(resp) => return Ok(resp),
                    Err(e) if e.is_transient() => last_err = e,
                    Err(e) => return Err(e),
                }
            }

            Err(last_err)
        };

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_output_tokens,
            "sending completion request"
        );

        tokio::time::timeout(self.timeout, attempts)
            .await
            .map_err(|_| ProviderError::Timeout(timeout_secs))?
    }

    fn name(&self) -> &str {
        super::DEFAULT_PROVIDER
    }
}

pub(crate) fn build_body(request: &CompletionRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            serde_json::json!({
                "role": role,
                "content": m.content,
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": request.model.0,
        "max_tokens": request.max_output_tokens,
        "messages": messages,
    });
    if let Some(system) = &request.system_prompt {
        body["system"] = serde_json::Value::String(system.clone());
    }
    body
}

pub(crate) fn classify_status(status: u16, retry_after_ms: Option<u64>, body: &str) -> ProviderError {
    let message = api_error_message(body);
    match status {
        401 | 403 => ProviderError::Auth(message),
        429 => ProviderError::RateLimited { retry_after_ms },
        _ => ProviderError::Api { status, message },
    }
}

/// `{"type":"error","error":{"message":...}}`, or the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

pub(crate) fn parse_response(json: &serde_json::Value) -> Result<CompletionResponse, ProviderError> {
    let blocks = json["content"]
        .as_array()
        .ok_or_else(|| ProviderError::InvalidResponse("No content in response".into()))?;

    let text: String = blocks
        .iter()
        .filter(|b| b["type"].as_str() == Some("text"))
        .filter_map(|b| b["text"].as_str())
        .collect();

    let usage = &json["usage"];
    let (Some(input_tokens), Some(output_tokens)) =
        (usage["input_tokens"].as_u64(), usage["output_tokens"].as_u64())
    else {
        return Err(ProviderError::InvalidResponse("No usage in response".into()));
    };

    Ok(CompletionResponse {
        text,
        usage: TokenUsage {
            input_tokens,
            output_tokens,
        },
    })
}

/// Exponential backoff with jitter
fn compute_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt.saturating_sub(1));
    let capped = base.min(MAX_BACKOFF_MS);
    // Add 0-25% jitter
    let jitter = (capped as f64 * 0.25 * rand_f64()) as u64;
    capped + jitter
}

fn rand_f64() -> f64 {
    use std::time::SystemTime;
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (seed as f64 % 1000.0) / 1000.0
}
