//! The one schema check applied to model replies: "must parse as JSON".
//!
//! No fence stripping, no trimming of prose around the object, no repair.
//! A reply wrapped in ```` ```json ```` fails here like any other prose, and
//! the user sees exactly what the model said.

use crate::error::{Stage, StageFailure};
use serde_json::Value;
use tracing::warn;

/// Parse `raw` as a JSON value, or keep it verbatim in a [`StageFailure`].
pub fn parse_model_json(stage: Stage, raw: &str) -> Result<Value, StageFailure> {
    serde_json::from_str(raw).map_err(|e| {
        warn!("{} reply is not JSON: {} ({} chars)", stage, e, raw.len());
        StageFailure {
            stage,
            detail: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object() {
        let v = parse_model_json(Stage::Extraction, r#"{"origen":"Madrid, España"}"#).unwrap();
        assert_eq!(v["origen"], "Madrid, España");
    }

    #[test]
    fn surrounding_whitespace_is_fine() {
        assert!(parse_model_json(Stage::Extraction, "\n  {\"a\": 1}\n").is_ok());
    }

    #[test]
    fn prose_keeps_raw_text() {
        let err = parse_model_json(Stage::Extraction, "I cannot process this.").unwrap_err();
        assert_eq!(err.stage, Stage::Extraction);
        assert_eq!(err.raw, "I cannot process this.");
        assert!(!err.detail.is_empty());
    }

    #[test]
    fn fenced_reply_is_not_repaired() {
        let raw = "```json\n{\"a\": 1}\n```";
        let err = parse_model_json(Stage::Recommendation, raw).unwrap_err();
        assert_eq!(err.raw, raw);
    }

    #[test]
    fn client_error_string_fails_here() {
        let raw = "Error processing the document: HTTP 400: API key not valid";
        assert!(parse_model_json(Stage::Extraction, raw).is_err());
    }
}
