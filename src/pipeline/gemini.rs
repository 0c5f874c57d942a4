//! Minimal REST client for the hosted Gemini `generateContent` endpoint.
//!
//! The credential is handed to [`GeminiClient::new`] and lives only as long
//! as the client, which the analyzer builds per request. It is sent in the
//! `x-goog-api-key` header, never in the URL, so it cannot leak into access
//! logs or error messages.

use crate::config::Credential;
use crate::error::{GreenLogisticsError, InferenceError};
use crate::pipeline::llm::{InferenceClient, InferenceRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest slice of an error body kept in [`InferenceError::Http`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Calls `{base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Credential,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    max_output_tokens: Option<usize>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: Credential,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, GreenLogisticsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("greenlogistics-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GreenLogisticsError::Internal(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature: None,
            max_output_tokens: None,
        })
    }

    /// Set the generation limits sent with every call.
    pub fn with_generation(mut self, temperature: Option<f32>, max_output_tokens: Option<usize>) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_body(&self, request: &InferenceRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        parts.push(Part::Text {
            text: request.instruction.clone(),
        });
        if let Some(ref image) = request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        let generation_config = if self.temperature.is_some() || self.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let body = self.build_body(&request);
        debug!(
            "Gemini {}: {} part(s), instruction {} chars",
            self.model,
            body.contents[0].parts.len(),
            request.instruction.len()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::Http {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| InferenceError::Transport(format!("Unreadable Gemini response: {e}")))?;
        response_text(parsed)
    }
}

/// Pull the human-readable message out of a Gemini error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => env.error.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(resp: GenerateContentResponse) -> Result<String, InferenceError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(InferenceError::EmptyResponse {
            reason: Some(reason),
        });
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or(InferenceError::EmptyResponse { reason: None })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(InferenceError::EmptyResponse {
            reason: candidate.finish_reason,
        });
    }
    Ok(text)
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
