//! Configuration types for shipment analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The API key is deliberately *not* part of
//! the config: it arrives per request as a [`Credential`] and is handed
//! straight to the client constructor.

use crate::error::GreenLogisticsError;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::render::PdfRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default model for edgequake-llm providers.
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-nano";

/// Public Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for a shipment analysis.
///
/// # Example
/// ```rust
/// use greenlogistics_ai::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.0-flash")
///     .max_rendered_pixels(1600)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Which remote capability answers the two calls. Default: [`InferenceBackend::Gemini`].
    pub backend: InferenceBackend,

    /// Model identifier. If None, uses the backend default.
    pub model: Option<String>,

    /// Base URL of the Gemini REST API. Default: the public endpoint.
    pub gemini_base_url: String,

    /// Pre-constructed inference client. Takes precedence over `backend`.
    pub client: Option<Arc<dyn InferenceClient>>,

    /// Pre-constructed PDF rasteriser. Default: pdfium.
    pub rasterizer: Option<Arc<dyn PdfRasterizer>>,

    /// Sampling temperature. If None, the model default applies.
    pub temperature: Option<f32>,

    /// Output token cap per call. If None, the model default applies.
    pub max_tokens: Option<usize>,

    /// Longest edge, in pixels, of the rasterised first PDF page. Default: 2000.
    ///
    /// Invoices and CMR notes are A4; 2000 px keeps small print legible
    /// while staying far below upload limits.
    pub max_rendered_pixels: u32,

    /// Largest accepted upload in bytes (browser UI). Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Observer for request state transitions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            model: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            client: None,
            rasterizer: None,
            temperature: None,
            max_tokens: None,
            max_rendered_pixels: 2000,
            max_upload_bytes: 20 * 1024 * 1024,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("client", &self.client.as_ref().map(|_| "<dyn InferenceClient>"))
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn PdfRasterizer>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model to request, falling back to the backend's default.
    pub fn effective_model(&self) -> &str {
        match (&self.model, &self.backend) {
            (Some(m), _) => m,
            (None, InferenceBackend::Gemini) => DEFAULT_GEMINI_MODEL,
            (None, InferenceBackend::Provider(_)) => DEFAULT_PROVIDER_MODEL,
        }
    }

    /// Whether the user must supply an API key before a request can start.
    ///
    /// Only the Gemini backend takes its key from the user; named providers
    /// read theirs from the environment.
    pub fn requires_credential(&self) -> bool {
        matches!(self.backend, InferenceBackend::Gemini)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn backend(mut self, backend: InferenceBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn client(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, GreenLogisticsError> {
        let c = &self.config;
        if !(c.gemini_base_url.starts_with("http://") || c.gemini_base_url.starts_with("https://"))
        {
            return Err(GreenLogisticsError::InvalidConfig(format!(
                "Gemini base URL must be http(s), got '{}'",
                c.gemini_base_url
            )));
        }
        if c.max_upload_bytes == 0 {
            return Err(GreenLogisticsError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if let InferenceBackend::Provider(ref name) = c.backend {
            if name.trim().is_empty() {
                return Err(GreenLogisticsError::InvalidConfig(
                    "Provider name must not be empty".into(),
                ));
            }
        }
        if matches!(c.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(GreenLogisticsError::InvalidConfig(
                "Model must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which remote capability serves the extraction and recommendation calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InferenceBackend {
    /// Google Gemini over REST; the API key is supplied per request. (default)
    #[default]
    Gemini,
    /// Any edgequake-llm provider by name ("openai", "anthropic", "ollama", …).
    /// Keys come from that provider's environment variables.
    Provider(String),
}

impl InferenceBackend {
    /// Parse a backend name as typed on the command line.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "" | "gemini" => InferenceBackend::Gemini,
            other => InferenceBackend::Provider(other.to_string()),
        }
    }
}

/// The user's API key.
///
/// Held only for the duration of a request; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, rejecting blank input.
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// The raw key, for the request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.backend, InferenceBackend::Gemini);
        assert_eq!(c.effective_model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(c.max_rendered_pixels, 2000);
        assert!(c.requires_credential());
    }

    #[test]
    fn provider_backend_uses_provider_default_model() {
        let c = AnalysisConfig::builder()
            .backend(InferenceBackend::from_name("OpenAI"))
            .build()
            .unwrap();
        assert_eq!(c.backend, InferenceBackend::Provider("openai".into()));
        assert_eq!(c.effective_model(), DEFAULT_PROVIDER_MODEL);
        assert!(!c.requires_credential());
    }

    #[test]
    fn builder_clamps_and_trims() {
        let c = AnalysisConfig::builder()
            .temperature(9.0)
            .max_rendered_pixels(10)
            .gemini_base_url("http://localhost:9000/")
            .build()
            .unwrap();
        assert_eq!(c.temperature, Some(2.0));
        assert_eq!(c.max_rendered_pixels, 100);
        assert_eq!(c.gemini_base_url, "http://localhost:9000");
    }

    #[test]
    fn builder_rejects_bad_base_url() {
        let err = AnalysisConfig::builder()
            .gemini_base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn builder_rejects_zero_upload_limit() {
        assert!(AnalysisConfig::builder().max_upload_bytes(0).build().is_err());
    }

    #[test]
    fn credential_rejects_blank_and_redacts() {
        assert!(Credential::new("   ").is_none());
        let c = Credential::new(" AIza-secret ").unwrap();
        assert_eq!(c.expose(), "AIza-secret");
        assert_eq!(format!("{c:?}"), "Credential(***)");
    }

    #[test]
    fn debug_does_not_leak_client() {
        let s = format!("{:?}", AnalysisConfig::default());
        assert!(s.contains("AnalysisConfig"));
        assert!(s.contains("backend"));
    }
}
