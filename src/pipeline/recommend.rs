//! Recommendation call: extracted record → road vs. intermodal comparison.

use crate::pipeline::llm::{InferenceClient, InferenceRequest};
use crate::prompts::recommendation_prompt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RECOMMENDATION_ERROR_PREFIX: &str = "Error generating the recommendation";

/// Text-only call carrying the extracted record.
///
/// Same containment as extraction: errors come back as text.
pub struct RecommendationClient {
    client: Arc<dyn InferenceClient>,
}

impl RecommendationClient {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn recommend(&self, shipment: &Value) -> String {
        let serialized = match serde_json::to_string_pretty(shipment) {
            Ok(s) => s,
            Err(e) => return failure_text(e),
        };
        info!("Requesting route comparison via {}", self.client.name());

        match self
            .client
            .generate(InferenceRequest::text(recommendation_prompt(&serialized)))
            .await
        {
            Ok(text) => {
                debug!("Recommendation reply: {} chars", text.len());
                text
            }
            Err(e) => failure_text(e),
        }
    }
}

fn failure_text(e: impl std::fmt::Display) -> String {
    warn!("Recommendation call failed: {}", e);
    format!("{RECOMMENDATION_ERROR_PREFIX}: {e}")
}
