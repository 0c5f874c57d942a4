//! End-to-end analysis flow against a scripted model.
//!
//! No network and no pdfium: the inference capability and the PDF rasteriser
//! are both stubbed through their traits.

use async_trait::async_trait;
use greenlogistics_ai::prompts::{EXTRACTION_PROMPT, NOT_FOUND};
use greenlogistics_ai::{
    analyze, AnalysisConfig, AnalysisOutcome, AnalysisProgressCallback, AnalysisState, Analyzer,
    GreenLogisticsError, InferenceClient, InferenceError, InferenceRequest, PdfRasterizer, Stage,
    UploadedDocument,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

const EXTRACTION_REPLY: &str = r#"{"origen":"Madrid, España","destino":"Berlín, Alemania","peso_total_kg":500,"descripcion_mercancia":"textiles","incoterm":"FOB","valor_mercancia_usd":10000}"#;

const RECOMMENDATION_REPLY: &str = r#"{
  "analisis": {
    "opcion_terrestre": {
      "coste_eur": "2100",
      "tiempo_horas": "30",
      "co2_kg": "420",
      "ventajas": ["Puerta a puerta", "Más rápido"],
      "desventajas": ["Mayor huella de carbono"]
    },
    "opcion_intermodal": {
      "coste_eur": "1650",
      "tiempo_horas": "52",
      "co2_kg": "105",
      "ventajas": ["75% menos CO₂"],
      "desventajas": ["Transbordo en Duisburgo"]
    },
    "recomendacion": "La opción intermodal reduce las emisiones a una cuarta parte."
  }
}"#;

// ── Stubs ────────────────────────────────────────────────────────────────

/// Answers each call with the next scripted reply and records the requests.
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
    calls: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, InferenceError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        self.calls.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::Provider("no scripted reply left".into())))
    }
}

/// Hands back a small image and remembers which pages were requested.
#[derive(Default)]
struct StubRasterizer {
    pages: Mutex<Vec<u16>>,
}

impl PdfRasterizer for StubRasterizer {
    fn render_page(
        &self,
        _bytes: &[u8],
        page_index: u16,
        _max_pixels: u32,
    ) -> Result<DynamicImage, GreenLogisticsError> {
        self.pages.lock().unwrap().push(page_index);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            16,
            16,
            Rgba([255, 255, 255, 255]),
        )))
    }
}

#[derive(Default)]
struct RecordingProgress {
    transitions: Mutex<Vec<(AnalysisState, AnalysisState)>>,
}

impl AnalysisProgressCallback for RecordingProgress {
    fn on_state_change(&self, from: AnalysisState, to: AnalysisState) {
        self.transitions.lock().unwrap().push((from, to));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn png_upload() -> UploadedDocument {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(24, 16, Rgba([0, 120, 0, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    UploadedDocument::new("factura.png", "image/png", buf)
}

/// Send pipeline logs to the test harness; `RUST_LOG=debug` shows each stage.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_with(model: Arc<ScriptedModel>, rasterizer: Arc<StubRasterizer>) -> AnalysisConfig {
    init_logging();
    AnalysisConfig::builder()
        .client(model)
        .rasterizer(rasterizer)
        .build()
        .unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_upload_runs_both_stages() {
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY, RECOMMENDATION_REPLY]);
    let rasterizer = Arc::new(StubRasterizer::default());
    let config = config_with(model.clone(), rasterizer.clone());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();

    let report = match outcome {
        AnalysisOutcome::Done(report) => report,
        other => panic!("expected Done, got {other:?}"),
    };
    assert_eq!(report.extracted.get("origen"), Some("Madrid, España"));
    assert_eq!(report.extracted.get("destino"), Some("Berlín, Alemania"));
    assert_eq!(report.extracted.get("peso_total_kg"), Some("500"));
    assert_eq!(report.extracted.get("valor_mercancia_usd"), Some("10000"));
    assert_eq!(report.comparison.ground.cost_eur, "2100");
    assert_eq!(report.comparison.intermodal.co2_kg, "105");
    assert_eq!(
        report.comparison.recommendation,
        "La opción intermodal reduce las emisiones a una cuarta parte."
    );

    // An image never touches the rasteriser.
    assert!(rasterizer.pages.lock().unwrap().is_empty());

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].instruction, EXTRACTION_PROMPT);
    assert_eq!(calls[0].image.as_ref().unwrap().mime_type, "image/png");
    assert!(calls[1].image.is_none());
    assert!(calls[1].instruction.contains("\"destino\": \"Berlín, Alemania\""));
}

#[tokio::test]
async fn pdf_upload_renders_only_first_page() {
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY, RECOMMENDATION_REPLY]);
    let rasterizer = Arc::new(StubRasterizer::default());
    let config = config_with(model, rasterizer.clone());
    let doc = UploadedDocument::new("cmr.pdf", "application/pdf", b"%PDF-1.7 four pages".to_vec());

    let outcome = analyze(&doc, &config, None).await.unwrap();

    assert_eq!(outcome.state(), AnalysisState::Done);
    assert_eq!(*rasterizer.pages.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn prose_extraction_stops_before_recommendation() {
    let model = ScriptedModel::replying(&["I cannot process this.", RECOMMENDATION_REPLY]);
    let config = config_with(model.clone(), Arc::default());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();

    let failure = match outcome {
        AnalysisOutcome::ExtractionFailed(failure) => failure,
        other => panic!("expected ExtractionFailed, got {other:?}"),
    };
    assert_eq!(failure.stage, Stage::Extraction);
    assert_eq!(failure.raw, "I cannot process this.");
    assert_eq!(model.calls().len(), 1, "recommendation must not be requested");
}

#[tokio::test]
async fn missing_fields_show_placeholder() {
    let model = ScriptedModel::replying(&[
        r#"{"origen":"Lyon, Francia","destino":"Milán, Italia"}"#,
        RECOMMENDATION_REPLY,
    ]);
    let config = config_with(model, Arc::default());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();
    let record = outcome.extracted().expect("extraction parsed");

    assert_eq!(record.fields.len(), 6);
    assert_eq!(record.get("origen"), Some("Lyon, Francia"));
    for key in ["peso_total_kg", "descripcion_mercancia", "incoterm", "valor_mercancia_usd"] {
        assert_eq!(record.get(key), Some(NOT_FOUND), "{key}");
    }
}

#[tokio::test]
async fn prose_recommendation_keeps_extracted_record() {
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY, "Sorry, I can't compare routes."]);
    let config = config_with(model.clone(), Arc::default());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();

    let (extracted, failure) = match outcome {
        AnalysisOutcome::RecommendationFailed { extracted, failure } => (extracted, failure),
        other => panic!("expected RecommendationFailed, got {other:?}"),
    };
    assert_eq!(extracted.get("incoterm"), Some("FOB"));
    assert_eq!(failure.stage, Stage::Recommendation);
    assert_eq!(failure.raw, "Sorry, I can't compare routes.");
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn recommendation_without_analysis_object_fails() {
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY, r#"{"recomendacion":"tren"}"#]);
    let config = config_with(model, Arc::default());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();

    assert_eq!(outcome.state(), AnalysisState::RecommendationFailed);
    let failure = outcome.failure().unwrap();
    assert!(failure.detail.contains("analisis"), "got: {}", failure.detail);
    assert_eq!(failure.raw, r#"{"recomendacion":"tren"}"#);
}

#[tokio::test]
async fn provider_error_surfaces_as_extraction_text() {
    let model = ScriptedModel::new(vec![Err(InferenceError::Http {
        status: 400,
        message: "API key not valid".into(),
    })]);
    let config = config_with(model.clone(), Arc::default());

    let outcome = analyze(&png_upload(), &config, None).await.unwrap();

    let failure = outcome.failure().expect("should fail");
    assert_eq!(failure.stage, Stage::Extraction);
    assert_eq!(
        failure.raw,
        "Error processing the document: HTTP 400: API key not valid"
    );
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn corrupt_image_never_reaches_the_model() {
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY]);
    let config = config_with(model.clone(), Arc::default());
    let doc = UploadedDocument::new("scan.jpg", "image/jpeg", b"definitely not a jpeg".to_vec());

    let outcome = analyze(&doc, &config, None).await.unwrap();

    let failure = outcome.failure().expect("should fail");
    assert!(failure.raw.starts_with("Error processing the document: Could not decode image"));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn report_is_reproducible_byte_for_byte() {
    let run = || async {
        let model = ScriptedModel::replying(&[EXTRACTION_REPLY, RECOMMENDATION_REPLY]);
        let config = config_with(model, Arc::default());
        let outcome = analyze(&png_upload(), &config, None).await.unwrap();
        outcome.report().unwrap().report.to_pretty_json().unwrap()
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);

    let v: serde_json::Value = serde_json::from_str(&first).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["datos_extraidos", "analisis_rutas"]);
    assert_eq!(v["datos_extraidos"]["destino"], "Berlín, Alemania");
    assert_eq!(v["analisis_rutas"]["opcion_intermodal"]["coste_eur"], "1650");
    assert!(first.contains("Berlín"), "non-ASCII must stay literal");
    assert!(first.starts_with("{\n  \"datos_extraidos\": {\n    \"origen\""));
}

#[tokio::test]
async fn progress_follows_state_machine() {
    let progress = Arc::new(RecordingProgress::default());
    let model = ScriptedModel::replying(&[EXTRACTION_REPLY, RECOMMENDATION_REPLY]);
    let config = AnalysisConfig::builder()
        .client(model)
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    Analyzer::from_config(&config, None)
        .unwrap()
        .analyze(&png_upload())
        .await;

    use AnalysisState::*;
    assert_eq!(
        *progress.transitions.lock().unwrap(),
        vec![
            (Idle, Uploading),
            (Uploading, Extracting),
            (Extracting, ExtractionParsed),
            (ExtractionParsed, Recommending),
            (Recommending, Done),
        ]
    );
}

#[tokio::test]
async fn progress_stops_at_extraction_failure() {
    let progress = Arc::new(RecordingProgress::default());
    let config = AnalysisConfig::builder()
        .client(ScriptedModel::replying(&["nope"]))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    analyze(&png_upload(), &config, None).await.unwrap();

    let transitions = progress.transitions.lock().unwrap();
    assert_eq!(
        transitions.last(),
        Some(&(AnalysisState::Extracting, AnalysisState::ExtractionFailed))
    );
    assert!(transitions.last().unwrap().1.is_terminal());
}

#[tokio::test]
async fn gemini_backend_requires_credential() {
    let err = analyze(&png_upload(), &AnalysisConfig::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, GreenLogisticsError::MissingCredential));
}
