//! # greenlogistics-ai
//!
//! Read a shipping document with a multimodal LLM, then ask the same model to
//! compare road and rail-intermodal transport for the shipment.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PNG / JPEG / PDF)
//!  │
//!  ├─ 1. Load     decode the image, or rasterise page 1 of the PDF (spawn_blocking)
//!  ├─ 2. Encode   PNG → base64 ImageData
//!  ├─ 3. Extract  image + instruction → six shipment fields as JSON
//!  ├─ 4. Parse    must be JSON, else stop and show the raw reply
//!  ├─ 5. Compare  extracted record → road vs. intermodal as JSON
//!  ├─ 6. Parse    must be JSON with an "analisis" object
//!  └─ 7. Report   {"datos_extraidos", "analisis_rutas"} for download
//! ```
//!
//! Every cost, transit time and CO₂ figure comes from the model. This crate
//! does not compute or validate them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greenlogistics_ai::{analyze_file, AnalysisConfig, AnalysisOutcome, Credential};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let key = Credential::new(std::env::var("GEMINI_API_KEY")?);
//!     match analyze_file("invoice.jpg", None, &config, key.as_ref()).await? {
//!         AnalysisOutcome::Done(r) => println!("{}", r.report.to_pretty_json()?),
//!         other => eprintln!("{}", other.failure().map(|f| f.raw.as_str()).unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Browser UI (`web` module: axum + tower-http) |
//! | `cli`    | on      | The `greenlogistics` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, AnalysisOutcome, Analyzer};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, Credential, InferenceBackend};
pub use error::{GreenLogisticsError, InferenceError, Stage, StageFailure};
pub use output::{
    AnalysisReport, ExtractedShipmentRecord, Report, RouteComparison, ShipmentField,
    TransportOption, REPORT_FILE_NAME, REPORT_MEDIA_TYPE,
};
pub use pipeline::input::UploadedDocument;
pub use pipeline::llm::{InferenceClient, InferenceRequest};
pub use pipeline::render::PdfRasterizer;
pub use progress::{AnalysisProgressCallback, AnalysisState, NoopProgressCallback, ProgressCallback};
