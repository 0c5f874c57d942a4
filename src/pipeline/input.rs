//! Uploaded documents and media-type classification.
//!
//! An upload is raw bytes plus the media type the browser (or the CLI's
//! extension guess) declared. It lives for one request and is dropped with it.
//! Classification trusts the declared type; the PDF magic bytes are checked
//! only so a mislabelled upload fails with a clear message instead of a
//! pdfium error code.

use crate::error::GreenLogisticsError;
use std::path::Path;
use tracing::debug;

/// What the loader has to do with an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A single raster image (PNG, JPEG, …). Decoded directly.
    Image,
    /// A paged document. Only the first page is rasterised.
    Pdf,
}

impl DocumentKind {
    /// Classify a declared media type.
    pub fn from_media_type(media_type: &str) -> Result<Self, GreenLogisticsError> {
        let essence = media_type_essence(media_type);

        if essence == "application/pdf" {
            Ok(DocumentKind::Pdf)
        } else if essence.starts_with("image/") {
            Ok(DocumentKind::Image)
        } else {
            Err(GreenLogisticsError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            })
        }
    }
}

/// Lowercased `type/subtype`, without parameters.
fn media_type_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Guess a media type from a file name, for uploads that arrive without one.
pub fn media_type_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// One uploaded shipping document.
#[derive(Clone)]
pub struct UploadedDocument {
    /// Original file name, for display only.
    pub name: String,
    /// Declared media type, e.g. `image/png` or `application/pdf`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Canonical image type for `data:` previews, or `None` when the
    /// declared type is not one browsers render inline.
    pub fn preview_media_type(&self) -> Option<&'static str> {
        match media_type_essence(&self.media_type).as_str() {
            "image/png" => Some("image/png"),
            "image/jpeg" | "image/jpg" => Some("image/jpeg"),
            "image/gif" => Some("image/gif"),
            "image/webp" => Some("image/webp"),
            _ => None,
        }
    }

    /// Read a local file, inferring the media type from its extension.
    pub async fn from_path(
        path: &Path,
        media_type: Option<&str>,
    ) -> Result<Self, GreenLogisticsError> {
        if !path.exists() {
            return Err(GreenLogisticsError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let media_type = match media_type.or_else(|| media_type_from_path(path)) {
            Some(m) => m.to_string(),
            None => {
                return Err(GreenLogisticsError::UnsupportedMediaType {
                    media_type: path
                        .extension()
                        .map(|e| format!(".{}", e.to_string_lossy()))
                        .unwrap_or_else(|| "<no extension>".to_string()),
                })
            }
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GreenLogisticsError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                GreenLogisticsError::Internal(format!("Failed to read {}: {e}", path.display()))
            }
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Read {} ({} bytes, {})", name, bytes.len(), media_type);
        Ok(Self::new(name, media_type, bytes))
    }

    /// Classify this upload, rejecting empty blobs and mislabelled PDFs.
    pub fn kind(&self) -> Result<DocumentKind, GreenLogisticsError> {
        if self.bytes.is_empty() {
            return Err(GreenLogisticsError::EmptyUpload {
                name: self.name.clone(),
            });
        }
        let kind = DocumentKind::from_media_type(&self.media_type)?;
        if kind == DocumentKind::Pdf && !self.bytes.starts_with(b"%PDF") {
            let magic: String = self
                .bytes
                .iter()
                .take(4)
                .map(|b| if b.is_ascii_graphic() { *b as char } else { '.' })
                .collect();
            return Err(GreenLogisticsError::CorruptPdf {
                detail: format!("'{}' does not start with %PDF (first bytes: {magic:?})", self.name),
            });
        }
        Ok(kind)
    }

    pub fn is_image(&self) -> bool {
        matches!(
            DocumentKind::from_media_type(&self.media_type),
            Ok(DocumentKind::Image)
        )
    }
}
