use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docrag_core::types::{QueryRequest, QueryResponse};

use crate::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"message": "RAG project!"}))
}

pub async fn llm_calls(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    match state.answerer.answer(&req.query).await {
        Ok(resp) => {
            tracing::info!(documents = resp.context.len(), "answered query");
            Json::<QueryResponse>(resp).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Internal API error: {err}")})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct DocumentQuery {
    pub path: String,
}

pub async fn download_document(State(state): State<Arc<AppState>>, Query(q): Query<DocumentQuery>) -> Response {
    let Some(path) = contained_path(&state.data_root, Path::new(&q.path)) else {
        return not_found(&q.path);
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().replace('"', ""))
                .unwrap_or_default();
            (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read document");
            not_found(&q.path)
        }
    }
}

/// Canonical form of `requested` if it is a regular file under `root`.
fn contained_path(root: &Path, requested: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let path = requested.canonicalize().ok()?;
    (path.starts_with(&root) && path.is_file()).then_some(path)
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": format!("document not found: {path}")}))).into_response()
}
