//! Gemini provider implementation using the `generateContent` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{check_http_response, GatewayError, GenerationRequest, TextGenerator};

/// Default Generative Language API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

const JSON_MIME_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation contents; always a single user turn here.
    pub contents: Vec<GeminiContent>,
    /// Output constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

/// A content entry in Gemini format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role: "user" or "model".
    #[serde(default)]
    pub role: String,
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A text part.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text payload; absent for non-text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Generation config for schema-constrained output.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Response MIME type.
    pub response_mime_type: String,
    /// Response schema.
    pub response_schema: Value,
}

/// `generateContent` response envelope.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Option<Vec<GeminiCandidate>>,
}

/// A single candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content.
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"__REDACTED__")
            .finish()
    }
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// An empty `api_key` is allowed; the endpoint then rejects calls and the
    /// failure surfaces as [`GatewayError::HttpStatus`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Gemini request body from a generation request.
#[doc(hidden)]
pub fn build_request(request: &GenerationRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_owned(),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        }],
        generation_config: request
            .response_schema
            .as_ref()
            .map(|schema| GeminiGenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_owned(),
                response_schema: schema.clone(),
            }),
    }
}

/// Extract the first candidate's first text part from a response body.
///
/// # Errors
///
/// Returns `GatewayError::MalformedResponse` if the body is not a valid
/// envelope or carries no candidate text.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, GatewayError> {
    let resp: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    resp.candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            GatewayError::MalformedResponse("response carried no candidate text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let body = build_request(&request);
        debug!(
            model = %self.model,
            prompt_chars = request.prompt.chars().count(),
            constrained = request.response_schema.is_some(),
            "sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
