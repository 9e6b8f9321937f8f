//! # REST API for History Export and Import
//!
//! `GET /api/history/export` answers with JSON holding the CSV text and file
//! name; `?format=csv` returns the file itself as a download.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use shared::ImportHistoryRequest;
use tracing::info;

use super::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history/export", get(export_history))
        .route("/history/import", post(import_history))
}

pub async fn export_history(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    info!("GET /api/history/export - format: {:?}", query.format);

    let export = match state.wallet_service.export_history().await {
        Ok(export) => export,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match query.format.as_deref() {
        None | Some("json") => (StatusCode::OK, Json(export)).into_response(),
        Some("csv") => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.filename),
                ),
            ],
            export.csv_content,
        )
            .into_response(),
        Some(other) => {
            ApiError::BadRequest(format!("Unsupported export format: {}", other)).into_response()
        }
    }
}

/// Record the EARN rows of pasted CSV text
pub async fn import_history(
    State(state): State<AppState>,
    Json(request): Json<ImportHistoryRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/history/import - {} bytes, class: {:?}",
        request.text.len(),
        request.class_name
    );
    match state.wallet_service.import_history(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
