//! Request lifecycle states and the observer that reports them.
//!
//! One user action drives one request through
//!
//! ```text
//! Idle ─▶ Uploading ─▶ Extracting ─┬─▶ ExtractionFailed
//!                                  └─▶ ExtractionParsed ─▶ Recommending ─┬─▶ RecommendationFailed
//!                                                                        └─▶ Done
//! ```
//!
//! Every terminal state returns to `Idle` on the next user action. Nothing is
//! retried automatically.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to drive a
//! spinner, a log line, or a test recorder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a single analysis request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisState {
    #[default]
    Idle,
    Uploading,
    Extracting,
    ExtractionParsed,
    ExtractionFailed,
    Recommending,
    Done,
    RecommendationFailed,
}

impl AnalysisState {
    /// No further progress happens without a new user action.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AnalysisState::ExtractionFailed
                | AnalysisState::RecommendationFailed
                | AnalysisState::Done
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            AnalysisState::ExtractionFailed | AnalysisState::RecommendationFailed
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: AnalysisState) -> bool {
        use AnalysisState::*;
        match (self, next) {
            (Idle, Uploading) => true,
            (Uploading, Extracting) => true,
            (Extracting, ExtractionParsed | ExtractionFailed) => true,
            (ExtractionParsed, Recommending) => true,
            (Recommending, Done | RecommendationFailed) => true,
            (s, Idle) => s.is_terminal(),
            _ => false,
        }
    }

    /// Human-readable status line.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisState::Idle => "Waiting for a document",
            AnalysisState::Uploading => "Reading the document…",
            AnalysisState::Extracting => "The AI is analysing your document…",
            AnalysisState::ExtractionParsed => "Data extracted",
            AnalysisState::ExtractionFailed => "Extraction failed",
            AnalysisState::Recommending => "Calculating the best route…",
            AnalysisState::Done => "Analysis complete",
            AnalysisState::RecommendationFailed => "Recommendation failed",
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the analyzer on every state transition.
///
/// Implementations must be `Send + Sync`; the browser UI serves requests on
/// the Tokio worker pool.
pub trait AnalysisProgressCallback: Send + Sync {
    /// The request moved from `from` to `to`.
    fn on_state_change(&self, from: AnalysisState, to: AnalysisState) {
        let _ = (from, to);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
