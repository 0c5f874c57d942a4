//! The remote inference capability.
//!
//! Both model calls go through [`InferenceClient`], a single-method trait.
//! Production code plugs in [`crate::pipeline::gemini::GeminiClient`] or a
//! [`ProviderClient`] wrapping any edgequake-llm provider; tests plug in a
//! stub that returns canned text.
//!
//! There is no retry here and no timeout beyond the HTTP client's own: one
//! request, one answer.

use crate::config::{AnalysisConfig, Credential, InferenceBackend};
use crate::error::{GreenLogisticsError, InferenceError};
use crate::pipeline::gemini::GeminiClient;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, info};

/// One call to the model: an instruction, optionally with an image.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub instruction: String,
    pub image: Option<ImageData>,
}

impl InferenceRequest {
    /// Text-only call shape.
    pub fn text(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            image: None,
        }
    }

    /// Image + text call shape.
    pub fn with_image(instruction: impl Into<String>, image: ImageData) -> Self {
        Self {
            instruction: instruction.into(),
            image: Some(image),
        }
    }
}

/// Sends one request to a hosted model and returns its raw text.
///
/// The text is not guaranteed to be JSON; callers own that risk.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn generate(&self, request: InferenceRequest) -> Result<String, InferenceError>;
}

/// Adapter from an edgequake-llm provider to [`InferenceClient`].
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl InferenceClient for ProviderClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let message = match request.image {
            Some(image) => ChatMessage::user_with_images(&request.instruction, vec![image]),
            None => ChatMessage::user(&request.instruction),
        };

        let response = self
            .provider
            .chat(&[message], Some(&self.options))
            .await
            .map_err(|e| InferenceError::Provider(e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(InferenceError::EmptyResponse { reason: None });
        }
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Resolve the inference client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`) — used as-is. Tests and callers
///    with custom middleware land here.
/// 2. **Named provider** (`InferenceBackend::Provider`) — constructed through
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    key from the environment.
/// 3. **Gemini** — built from the credential the user supplied with this
///    request. No credential, no client.
pub fn resolve_client(
    config: &AnalysisConfig,
    credential: Option<&Credential>,
) -> Result<Arc<dyn InferenceClient>, GreenLogisticsError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let model = config.effective_model();
    match config.backend {
        InferenceBackend::Provider(ref name) => {
            info!("Using provider '{}' with model '{}'", name, model);
            let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
                GreenLogisticsError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: format!("{e}"),
                }
            })?;
            Ok(Arc::new(ProviderClient::new(
                provider,
                format!("{name}/{model}"),
                config,
            )))
        }
        InferenceBackend::Gemini => {
            let credential = credential.ok_or(GreenLogisticsError::MissingCredential)?;
            info!("Using Gemini model '{}'", model);
            let client = GeminiClient::new(credential.clone(), model, &config.gemini_base_url)?
                .with_generation(config.temperature, config.max_tokens);
            Ok(Arc::new(client))
        }
    }
}
