//! PDF rasterisation: render the first page of an uploaded PDF via pdfium.
//!
//! Rendering sits behind [`PdfRasterizer`] so the loader can be exercised
//! without a pdfium shared library; production code uses [`PdfiumRasterizer`].
//! Implementations are synchronous and are called from `spawn_blocking`,
//! since pdfium keeps thread-local state and must not run on async workers.

use crate::error::GreenLogisticsError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Turns one page of a PDF byte blob into an image.
pub trait PdfRasterizer: Send + Sync {
    /// Render page `page_index` (0-based), longest edge capped at `max_pixels`.
    fn render_page(
        &self,
        bytes: &[u8],
        page_index: u16,
        max_pixels: u32,
    ) -> Result<DynamicImage, GreenLogisticsError>;
}

/// pdfium-backed rasteriser.
///
/// Binds to the library named by `PDFIUM_LIB_PATH`, else to the system
/// library search path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfRasterizer for PdfiumRasterizer {
    fn render_page(
        &self,
        bytes: &[u8],
        page_index: u16,
        max_pixels: u32,
    ) -> Result<DynamicImage, GreenLogisticsError> {
        let pdfium = bind_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| GreenLogisticsError::CorruptPdf {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        if total_pages == 0 {
            return Err(GreenLogisticsError::EmptyPdf);
        }

        let page = pages
            .get(page_index)
            .map_err(|e| GreenLogisticsError::RasterisationFailed {
                page: page_index as usize + 1,
                detail: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(max_pixels as i32)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            GreenLogisticsError::RasterisationFailed {
                page: page_index as usize + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_index as usize + 1,
            image.width(),
            image.height()
        );

        Ok(image)
    }
}

/// Locate and bind the pdfium shared library.
fn bind_pdfium() -> Result<Pdfium, GreenLogisticsError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            Pdfium::bind_to_library(&path)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| GreenLogisticsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
