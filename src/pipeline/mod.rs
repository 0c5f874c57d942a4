//! Pipeline stages for shipment-document analysis.
//!
//! Each submodule implements one step. The network-facing steps sit behind
//! [`llm::InferenceClient`] and PDF rendering sits behind
//! [`render::PdfRasterizer`], so every stage can be tested without a model
//! or a pdfium library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ loader ──▶ encode ──▶ extract ──▶ parse ──▶ recommend ──▶ parse
//! (blob)   (1 image)  (base64)   (image+text)  (JSON)    (text only)    (JSON)
//! ```
//!
//! 1. [`input`]     — the uploaded blob and its declared media type
//! 2. [`loader`]    — decode an image, or rasterise page 0 of a PDF via [`render`]
//! 3. [`encode`]    — PNG-encode and base64-wrap the image for the request body
//! 4. [`extract`]   — first model call; errors come back as text
//! 5. [`parse`]     — "must parse as JSON", raw text kept on failure
//! 6. [`recommend`] — second model call over the extracted record
//!
//! [`llm`] and [`gemini`] are the two implementations of the model call.

pub mod encode;
pub mod extract;
pub mod gemini;
pub mod input;
pub mod llm;
pub mod loader;
pub mod parse;
pub mod recommend;
pub mod render;
