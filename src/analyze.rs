//! Request orchestration: one upload in, one [`AnalysisOutcome`] out.
//!
//! The sequence is strictly linear. Extraction runs first; the recommendation
//! call is made only if the extraction reply parsed as JSON. A reply that does
//! not parse ends the request at that stage with the raw text preserved.
//! Nothing is retried.

use crate::config::{AnalysisConfig, Credential};
use crate::error::{GreenLogisticsError, Stage, StageFailure};
use crate::output::{AnalysisReport, ExtractedShipmentRecord, RouteComparison};
use crate::pipeline::extract::ExtractionClient;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::llm::{resolve_client, InferenceClient};
use crate::pipeline::loader::DocumentLoader;
use crate::pipeline::parse::parse_model_json;
use crate::pipeline::recommend::RecommendationClient;
use crate::progress::{AnalysisState, ProgressCallback};
use crate::prompts::KEY_ANALYSIS;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// How a request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The extraction reply was not JSON. The recommendation was never requested.
    ExtractionFailed(StageFailure),
    /// Extraction succeeded; the recommendation reply was unusable.
    RecommendationFailed {
        extracted: ExtractedShipmentRecord,
        failure: StageFailure,
    },
    Done(AnalysisReport),
}

impl AnalysisOutcome {
    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> AnalysisState {
        match self {
            AnalysisOutcome::ExtractionFailed(_) => AnalysisState::ExtractionFailed,
            AnalysisOutcome::RecommendationFailed { .. } => AnalysisState::RecommendationFailed,
            AnalysisOutcome::Done(_) => AnalysisState::Done,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            AnalysisOutcome::ExtractionFailed(f) => Some(f),
            AnalysisOutcome::RecommendationFailed { failure, .. } => Some(failure),
            AnalysisOutcome::Done(_) => None,
        }
    }

    pub fn extracted(&self) -> Option<&ExtractedShipmentRecord> {
        match self {
            AnalysisOutcome::ExtractionFailed(_) => None,
            AnalysisOutcome::RecommendationFailed { extracted, .. } => Some(extracted),
            AnalysisOutcome::Done(r) => Some(&r.extracted),
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Done(r) => Some(r),
            _ => None,
        }
    }
}

/// Drives extraction and recommendation for one request.
pub struct Analyzer {
    extraction: ExtractionClient,
    recommendation: RecommendationClient,
    progress: Option<ProgressCallback>,
}

impl Analyzer {
    /// Build an analyzer around an already-resolved client.
    pub fn new(client: Arc<dyn InferenceClient>, config: &AnalysisConfig) -> Self {
        Self {
            extraction: ExtractionClient::new(Arc::clone(&client), DocumentLoader::from_config(config)),
            recommendation: RecommendationClient::new(client),
            progress: config.progress_callback.clone(),
        }
    }

    /// Resolve the client from `config` and the request's credential.
    pub fn from_config(
        config: &AnalysisConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, GreenLogisticsError> {
        let client = resolve_client(config, credential)?;
        Ok(Self::new(client, config))
    }

    pub async fn analyze(&self, doc: &UploadedDocument) -> AnalysisOutcome {
        let start = Instant::now();
        info!("Analysing '{}' ({})", doc.name, doc.media_type);

        self.transition(AnalysisState::Idle, AnalysisState::Uploading);
        self.transition(AnalysisState::Uploading, AnalysisState::Extracting);

        let raw = self.extraction.extract_document(doc).await;
        let extracted = match parse_model_json(Stage::Extraction, &raw) {
            Ok(v) => ExtractedShipmentRecord::from_value(v),
            Err(failure) => {
                self.transition(AnalysisState::Extracting, AnalysisState::ExtractionFailed);
                return AnalysisOutcome::ExtractionFailed(failure);
            }
        };
        self.transition(AnalysisState::Extracting, AnalysisState::ExtractionParsed);

        self.transition(AnalysisState::ExtractionParsed, AnalysisState::Recommending);
        let raw = self.recommendation.recommend(extracted.value()).await;
        let comparison = match parse_model_json(Stage::Recommendation, &raw).and_then(|v| {
            RouteComparison::from_value(&v).ok_or_else(|| {
                warn!("Recommendation reply has no '{}' object", KEY_ANALYSIS);
                StageFailure {
                    stage: Stage::Recommendation,
                    detail: format!("reply has no \"{KEY_ANALYSIS}\" object"),
                    raw: raw.clone(),
                }
            })
        }) {
            Ok(c) => c,
            Err(failure) => {
                self.transition(AnalysisState::Recommending, AnalysisState::RecommendationFailed);
                return AnalysisOutcome::RecommendationFailed { extracted, failure };
            }
        };

        self.transition(AnalysisState::Recommending, AnalysisState::Done);
        info!("Analysis of '{}' done in {}ms", doc.name, start.elapsed().as_millis());
        AnalysisOutcome::Done(AnalysisReport::new(extracted, comparison))
    }

    fn transition(&self, from: AnalysisState, to: AnalysisState) {
        debug_assert!(from.can_advance_to(to), "{from:?} -> {to:?}");
        if let Some(ref cb) = self.progress {
            cb.on_state_change(from, to);
        }
    }
}

/// Analyse one uploaded document.
///
/// # Errors
/// Only setup failures are `Err`: an unknown provider, or the Gemini backend
/// without a credential. Everything after that is reported in the outcome.
pub async fn analyze(
    doc: &UploadedDocument,
    config: &AnalysisConfig,
    credential: Option<&Credential>,
) -> Result<AnalysisOutcome, GreenLogisticsError> {
    let analyzer = Analyzer::from_config(config, credential)?;
    Ok(analyzer.analyze(doc).await)
}

/// Read a local file and analyse it.
///
/// The media type is guessed from the extension unless given.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    media_type: Option<&str>,
    config: &AnalysisConfig,
    credential: Option<&Credential>,
) -> Result<AnalysisOutcome, GreenLogisticsError> {
    let analyzer = Analyzer::from_config(config, credential)?;
    let doc = UploadedDocument::from_path(path.as_ref(), media_type).await?;
    Ok(analyzer.analyze(&doc).await)
}
