use super::html;
use super::AppState;
use crate::analyze::Analyzer;
use crate::config::Credential;
use crate::error::GreenLogisticsError;
use crate::pipeline::input::{media_type_from_path, UploadedDocument};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Upload form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(html::index_page(&state.config))
}

/// Run one analysis for the submitted form.
///
/// The whole request is handled inline: the response is sent once both
/// model calls have returned.
pub async fn analyze_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let form = match read_form(multipart).await {
        Ok(f) => f,
        Err((status, message)) => return (status, Html(html::error_page(&message))),
    };

    let Some(doc) = form.document else {
        return (
            StatusCode::BAD_REQUEST,
            Html(html::error_page("Please choose a document to analyse.")),
        );
    };

    let credential = form.api_key.as_deref().and_then(Credential::new);
    if state.config.requires_credential() && credential.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Html(html::error_page(
                "Please enter your Gemini API key before analysing a document.",
            )),
        );
    }

    if let Err(e) = doc.kind() {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, Html(html::error_page(&e.to_string())));
    }

    let analyzer = match Analyzer::from_config(&state.config, credential.as_ref()) {
        Ok(a) => a,
        Err(e) => {
            warn!("Could not set up the inference client: {}", e);
            let status = match e {
                GreenLogisticsError::MissingCredential => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return (status, Html(html::error_page(&e.to_string())));
        }
    };

    let outcome = analyzer.analyze(&doc).await;
    info!("'{}' finished: {}", doc.name, outcome.state());
    (StatusCode::OK, Html(html::result_page(&doc, &outcome)))
}

#[derive(Default)]
struct UploadForm {
    api_key: Option<String>,
    document: Option<UploadedDocument>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, (StatusCode, String)> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("api_key") => {
                form.api_key = Some(field.text().await.map_err(|e| (e.status(), e.body_text()))?);
            }
            Some("document") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let declared = field
                    .content_type()
                    .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
                    .map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| (e.status(), e.body_text()))?;

                // Browsers send an empty part when no file was chosen.
                if name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let media_type = declared
                    .or_else(|| media_type_from_path(Path::new(&name)).map(str::to_string))
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                form.document = Some(UploadedDocument::new(name, media_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}
