//! Document loader: uploaded blob → exactly one image.
//!
//! Images are decoded directly and never reach the rasteriser. PDFs are
//! rasterised through [`PdfRasterizer`] for page 0 only; later pages are
//! never touched. Both paths run on the blocking pool.

use crate::config::AnalysisConfig;
use crate::error::GreenLogisticsError;
use crate::pipeline::input::{DocumentKind, UploadedDocument};
use crate::pipeline::render::{PdfRasterizer, PdfiumRasterizer};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Page rendered for paged documents.
pub const FIRST_PAGE: u16 = 0;

/// Produces the single image an upload is analysed from.
#[derive(Clone)]
pub struct DocumentLoader {
    rasterizer: Arc<dyn PdfRasterizer>,
    max_rendered_pixels: u32,
}

impl DocumentLoader {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, max_rendered_pixels: u32) -> Self {
        Self {
            rasterizer,
            max_rendered_pixels,
        }
    }

    /// Loader using the configured rasteriser, or pdfium.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let rasterizer = config
            .rasterizer
            .clone()
            .unwrap_or_else(|| Arc::new(PdfiumRasterizer));
        Self::new(rasterizer, config.max_rendered_pixels)
    }

    /// Decode `doc` into one in-memory image.
    pub async fn load(&self, doc: &UploadedDocument) -> Result<DynamicImage, GreenLogisticsError> {
        let kind = doc.kind()?;
        let bytes = doc.bytes.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let max_pixels = self.max_rendered_pixels;

        info!("Loading '{}' as {:?} ({} bytes)", doc.name, kind, bytes.len());

        let image = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Image => decode_image(&bytes),
            DocumentKind::Pdf => rasterizer.render_page(&bytes, FIRST_PAGE, max_pixels),
        })
        .await
        .map_err(|e| GreenLogisticsError::Internal(format!("Load task panicked: {}", e)))??;

        debug!("Loaded image {}x{} px", image.width(), image.height());
        Ok(image)
    }
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, GreenLogisticsError> {
    image::load_from_memory(bytes).map_err(|e| GreenLogisticsError::ImageDecode {
        detail: e.to_string(),
    })
}
