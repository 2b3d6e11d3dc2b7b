//! HTTP query service: health check, grounded answers and source downloads.

pub mod routes;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use docrag_pipeline::Answerer;

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub answerer: Arc<Answerer>,
    /// Only files below this directory are served by `/documents`.
    pub data_root: PathBuf,
}

impl AppState {
    pub fn new(answerer: Answerer, data_root: PathBuf) -> Self {
        Self { answerer: Arc::new(answerer), data_root }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health))
        .route("/llm_calls", post(routes::llm_calls))
        .route("/documents", get(routes::download_document))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(Arc::new(state))
}
