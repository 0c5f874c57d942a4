//! Extraction call: document image + fixed instruction → raw reply text.
//!
//! Failures never escape as `Err`. A loader, encoder, transport or provider
//! failure becomes a string starting with [`EXTRACTION_ERROR_PREFIX`], which
//! then fails JSON parsing like any other non-JSON reply.

use crate::pipeline::encode::encode_image;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::llm::{InferenceClient, InferenceRequest};
use crate::pipeline::loader::DocumentLoader;
use crate::prompts::EXTRACTION_PROMPT;
use edgequake_llm::ImageData;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EXTRACTION_ERROR_PREFIX: &str = "Error processing the document";

pub struct ExtractionClient {
    client: Arc<dyn InferenceClient>,
    loader: DocumentLoader,
}

impl ExtractionClient {
    pub fn new(client: Arc<dyn InferenceClient>, loader: DocumentLoader) -> Self {
        Self { client, loader }
    }

    /// Send one image with the extraction instruction.
    pub async fn extract(&self, image: ImageData) -> String {
        info!("Extracting shipment fields via {}", self.client.name());
        match self
            .client
            .generate(InferenceRequest::with_image(EXTRACTION_PROMPT, image))
            .await
        {
            Ok(text) => {
                debug!("Extraction reply: {} chars", text.len());
                text
            }
            Err(e) => failure_text(e),
        }
    }

    /// Load, encode and extract an uploaded document.
    pub async fn extract_document(&self, doc: &UploadedDocument) -> String {
        let image = match self.loader.load(doc).await {
            Ok(img) => img,
            Err(e) => return failure_text(e),
        };
        let data = match encode_image(&image) {
            Ok(d) => d,
            Err(e) => return failure_text(e),
        };
        self.extract(data).await
    }
}

fn failure_text(e: impl std::fmt::Display) -> String {
    warn!("Extraction call failed: {}", e);
    format!("{EXTRACTION_ERROR_PREFIX}: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GreenLogisticsError, InferenceError};
    use crate::pipeline::render::PdfRasterizer;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::sync::Mutex;

    struct Recorder {
        reply: Result<String, InferenceError>,
        seen: Mutex<Vec<InferenceRequest>>,
    }

    #[async_trait]
    impl InferenceClient for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn generate(&self, request: InferenceRequest) -> Result<String, InferenceError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    struct NoPdf;

    impl PdfRasterizer for NoPdf {
        fn render_page(&self, _: &[u8], _: u16, _: u32) -> Result<DynamicImage, GreenLogisticsError> {
            Err(GreenLogisticsError::PdfiumBindingFailed("not available in tests".into()))
        }
    }

    fn extractor(reply: Result<String, InferenceError>) -> (Arc<Recorder>, ExtractionClient) {
        let rec = Arc::new(Recorder {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let client = ExtractionClient::new(rec.clone(), DocumentLoader::new(Arc::new(NoPdf), 2000));
        (rec, client)
    }

    #[tokio::test]
    async fn sends_image_and_instruction() {
        let (rec, client) = extractor(Ok("{}".into()));
        let out = client.extract(ImageData::new("QUJD", "image/png")).await;

        assert_eq!(out, "{}");
        let seen = rec.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].instruction, EXTRACTION_PROMPT);
        assert_eq!(seen[0].image.as_ref().unwrap().data, "QUJD");
    }

    #[tokio::test]
    async fn provider_error_becomes_text() {
        let (_, client) = extractor(Err(InferenceError::Http {
            status: 403,
            message: "permission denied".into(),
        }));
        let out = client.extract(ImageData::new("QUJD", "image/png")).await;
        assert_eq!(out, "Error processing the document: HTTP 403: permission denied");
    }

    #[tokio::test]
    async fn loader_error_becomes_text_without_calling_model() {
        let (rec, client) = extractor(Ok("{}".into()));
        let doc = UploadedDocument::new("bl.pdf", "application/pdf", b"%PDF-1.4".to_vec());

        let out = client.extract_document(&doc).await;
        assert!(out.starts_with(EXTRACTION_ERROR_PREFIX), "got: {out}");
        assert!(out.contains("pdfium"), "got: {out}");
        assert!(rec.seen.lock().unwrap().is_empty());
    }
}
