//! Generation gateway abstraction.
//!
//! Defines the [`TextGenerator`] trait and the shared request and error types
//! used by the chat assistant and the impact scenario generator. Both flows
//! reduce to "one prompt in, one text out": the whole policy and transcript
//! travel in-band in the prompt.
//!
//! One implementation is provided:
//! - [`gemini::GeminiClient`] — Google Generative Language `generateContent` API

use async_trait::async_trait;
use regex::Regex;

pub mod gemini;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A single-shot generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text sent as one user turn.
    pub prompt: String,
    /// Optional response schema. When present the provider is asked for
    /// JSON output constrained to this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    /// Free-form text request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    /// JSON request constrained by `schema`.
    pub fn json(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by a generation gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP transport failure.
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream responded with an error status.
    #[error("generation endpoint returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response envelope did not contain a generated text candidate.
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Whether the failure happened before a usable HTTP response arrived
    /// or the endpoint rejected the call.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Request(_) | Self::HttpStatus { .. })
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `GatewayError::Request` on transport failure, `GatewayError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GatewayError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"AIza[A-Za-z0-9_\-]{30,}",
        r"key=[A-Za-z0-9_\-]{8,}",
        r"ya29\.[A-Za-z0-9_\-]{20,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Narrow interface to an external text generation service.
///
/// Implementations must be `Send + Sync` so a single client can be shared
/// between the chat controller and the scenario generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Perform one round trip and return the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on network, status, or envelope failure.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError>;

    /// The model identifier this generator targets.
    fn model_id(&self) -> &str;
}
