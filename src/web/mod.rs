//! Browser UI.
//!
//! `GET /` serves the upload form, `POST /analyze` runs one request and
//! renders the result page, `GET /health` answers liveness probes. The server
//! keeps no state between requests: the API key and the upload live only for
//! the request that carried them, and the report download is embedded in the
//! result page as a `data:` URI.

mod handlers;
pub mod html;

use crate::config::AnalysisConfig;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::{analyze_upload, health_check, index, HealthResponse};

/// Room for multipart boundaries and the API key field on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// State shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AnalysisConfig>,
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_upload))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server and serve until the process is stopped.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("GreenLogisticsAI listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
