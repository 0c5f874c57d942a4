//! Error types for the greenlogistics-ai library.
//!
//! Three types reflect three distinct failure modes:
//!
//! * [`GreenLogisticsError`] — **Fatal** for the call that raised it: bad
//!   configuration, missing credential, an upload that cannot be decoded.
//!   Returned as `Err` from setup paths and from the document loader.
//!
//! * [`InferenceError`] — the remote model could not be reached or refused
//!   the request. The extraction and recommendation clients turn these into
//!   plain strings at the call site, so they never cross the pipeline
//!   boundary as structured errors.
//!
//! * [`StageFailure`] — the model answered, but its text is not the JSON the
//!   instruction asked for. Carries the raw text so it can be shown verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the greenlogistics-ai library.
#[derive(Debug, Error)]
pub enum GreenLogisticsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The declared media type is neither an image nor a PDF.
    #[error("Unsupported media type '{media_type}': upload a PNG, JPEG or PDF document")]
    UnsupportedMediaType { media_type: String },

    /// The upload is empty.
    #[error("The uploaded document '{name}' is empty")]
    EmptyUpload { name: String },

    /// The bytes claim to be an image but could not be decoded.
    #[error("Could not decode image: {detail}")]
    ImageDecode { detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt or encrypted: {detail}")]
    CorruptPdf { detail: String },

    /// The PDF parsed but contains no pages.
    #[error("PDF has no pages")]
    EmptyPdf,

    /// pdfium-render returned an error while rasterising the first page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF uploads need the pdfium shared library.\n\
  • Install libpdfium system-wide, or\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The Gemini backend needs an API key and none was supplied.
    #[error("An API key is required for the Gemini backend. Enter it in the form or pass --api-key.")]
    MissingCredential,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the exported report.
    #[error("Failed to write report '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single call to the remote inference capability.
///
/// No distinction is drawn between retryable and permanent failures; the
/// caller never retries.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never completed (DNS, TLS, connection reset, …).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered 200 but with no usable text.
    #[error("Empty response from model{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse { reason: Option<String> },

    /// An edgequake-llm provider returned an error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Which of the two model calls produced a [`StageFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Extraction,
    Recommendation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => f.write_str("extraction"),
            Stage::Recommendation => f.write_str("recommendation"),
        }
    }
}

/// The model's reply for `stage` could not be used.
///
/// `raw` is the exact text that was received (possibly an error string from
/// the client itself) and must be shown to the user unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Error processing the AI response ({stage}): {detail}")]
pub struct StageFailure {
    pub stage: Stage,
    pub detail: String,
    pub raw: String,
}
