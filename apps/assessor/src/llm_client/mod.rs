//! LLM Client: the single point of entry for all model calls made by the assessor.
//!
//! ARCHITECTURAL RULE: agents never talk to a vendor API directly. They hold an
//! `Arc<dyn ModelProvider>` and every call goes through `ModelProvider::complete`.
//!
//! Which vendor and model sits behind the trait is configuration (`ProviderConfig`),
//! never workflow logic.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::errors::ConfigError;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;

/// Base delay for the exponential backoff between retried attempts: 1s, 2s, 4s, ...
const BACKOFF_BASE: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed (status {status}): {message}")]
    AuthFailed { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Model call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ProviderError {
    fn from_transport(err: reqwest::Error, request_timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(request_timeout)
        } else {
            ProviderError::Http(err)
        }
    }
}

/// One model invocation. `agent` names the caller for logs and test doubles.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub agent: &'static str,
    pub system: &'a str,
    pub prompt: &'a str,
}

/// A chat-completion backend that returns the raw text of the model's reply.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The model identifier requests are sent to.
    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => anthropic::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anthropic => f.write_str("anthropic"),
            ProviderKind::OpenAi => f.write_str("openai"),
            ProviderKind::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Everything needed to construct a provider client.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Timeout for a single HTTP attempt.
    pub request_timeout: Duration,
    /// Retries after the first attempt on 429 / 5xx / transport errors.
    pub max_retries: u32,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Builds the configured provider behind a trait object.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let client = Client::builder().timeout(config.request_timeout).build()?;

    Ok(match config.kind {
        ProviderKind::Anthropic => Arc::new(anthropic::AnthropicProvider::new(client, config)),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::new(client, config)),
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(client, config)),
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub request_timeout: Duration,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            request_timeout: config.request_timeout,
            backoff_base: BACKOFF_BASE,
        }
    }
}

/// Sends a request built by `build`, retrying on 429, 5xx and transport errors
/// with exponential backoff. Returns the successful response body.
///
/// 401 / 403 fail immediately as `AuthFailed`; other 4xx fail immediately as `Api`.
pub(crate) async fn send_with_retry<F>(policy: RetryPolicy, build: F) -> Result<String, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<ProviderError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.backoff_base * (1 << (attempt - 1).min(6));
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(ProviderError::from_transport(e, policy.request_timeout));
                continue;
            }
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            last_error = Some(if status == StatusCode::TOO_MANY_REQUESTS {
                ProviderError::RateLimited { retries: attempt }
            } else {
                ProviderError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                }
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(body);
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ProviderError::AuthFailed {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(e, policy.request_timeout));
    }

    Err(last_error.unwrap_or(ProviderError::RateLimited {
        retries: policy.max_retries,
    }))
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// All supported vendors wrap errors as `{"error": {"message": ...}}`.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_provider_kind_parses_case_insensitively() {
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!(" openai ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("GEMINI".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::Gemini.api_key_var(), "GEMINI_API_KEY");
        assert_eq!(ProviderKind::Gemini.to_string(), "gemini");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = "cohere".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(ref p) if p == "cohere"));
    }

    #[test]
    fn test_api_error_message_extracts_nested_message() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad key"}}"#;
        assert_eq!(api_error_message(body.to_string()), "bad key");
    }

    #[test]
    fn test_api_error_message_falls_back_to_raw_body() {
        assert_eq!(api_error_message("gateway down".to_string()), "gateway down");
    }

    #[test]
    fn test_provider_config_debug_redacts_api_key() {
        let config = ProviderConfig {
            kind: ProviderKind::Anthropic,
            api_key: "sk-secret".to_string(),
            model: "m".to_string(),
            temperature: 0.4,
            max_tokens: 10,
            request_timeout: Duration::from_secs(1),
            max_retries: 0,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_timeout_error_reports_seconds() {
        let err = ProviderError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Model call timed out after 30s");
    }

    mod retry {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use std::time::{Duration, Instant};

        use axum::{extract::State, http::StatusCode as HttpStatus, routing::post, Router};
        use reqwest::Client;

        use crate::llm_client::{send_with_retry, ProviderError, RetryPolicy};

        struct Stub {
            responses: Vec<(u16, &'static str)>,
            hits: AtomicUsize,
        }

        async fn respond(State(stub): State<Arc<Stub>>) -> (HttpStatus, &'static str) {
            let i = stub.hits.fetch_add(1, Ordering::SeqCst);
            let (status, body) = stub.responses[i.min(stub.responses.len() - 1)];
            (HttpStatus::from_u16(status).unwrap(), body)
        }

        /// Serves `responses` in order on a local port; the last one repeats.
        async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Stub>) {
            let stub = Arc::new(Stub {
                responses,
                hits: AtomicUsize::new(0),
            });
            let app = Router::new().route("/", post(respond)).with_state(stub.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/", listener.local_addr().unwrap());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (url, stub)
        }

        fn policy(max_retries: u32) -> RetryPolicy {
            RetryPolicy {
                max_retries,
                request_timeout: Duration::from_secs(5),
                backoff_base: Duration::from_millis(20),
            }
        }

        async fn send(url: &str, max_retries: u32) -> Result<String, ProviderError> {
            let client = Client::new();
            send_with_retry(policy(max_retries), || client.post(url).body("{}")).await
        }

        #[tokio::test]
        async fn test_unauthorized_fails_without_retry() {
            let (url, stub) = serve(vec![(401, r#"{"error":{"message":"nope"}}"#)]).await;
            let err = send(&url, 3).await.unwrap_err();
            match err {
                ProviderError::AuthFailed { status, message } => {
                    assert_eq!(status, 401);
                    assert_eq!(message, "nope");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_forbidden_is_auth_failure() {
            let (url, _stub) = serve(vec![(403, "denied")]).await;
            let err = send(&url, 3).await.unwrap_err();
            assert!(matches!(err, ProviderError::AuthFailed { status: 403, .. }));
        }

        #[tokio::test]
        async fn test_client_error_is_not_retried() {
            let (url, stub) = serve(vec![(400, "bad request")]).await;
            let err = send(&url, 3).await.unwrap_err();
            assert!(matches!(err, ProviderError::Api { status: 400, .. }));
            assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_persistent_rate_limit_exhausts_retries() {
            let (url, stub) = serve(vec![(429, "slow down")]).await;
            let err = send(&url, 2).await.unwrap_err();
            assert!(matches!(err, ProviderError::RateLimited { retries: 2 }));
            assert_eq!(stub.hits.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_server_error_then_success_after_backoff() {
            let (url, stub) = serve(vec![(503, "overloaded"), (200, r#"{"ok":true}"#)]).await;
            let started = Instant::now();
            let body = send(&url, 3).await.unwrap();
            assert_eq!(body, r#"{"ok":true}"#);
            assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
            assert!(started.elapsed() >= Duration::from_millis(20));
        }

        #[tokio::test]
        async fn test_exhausted_server_errors_report_last_status() {
            let (url, _stub) = serve(vec![(502, "bad gateway")]).await;
            let err = send(&url, 1).await.unwrap_err();
            assert!(matches!(err, ProviderError::Api { status: 502, .. }));
        }
    }
}
