//! # REST API for Settings

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::Settings;
use tracing::info;

use super::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings");
    match state.wallet_service.settings().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Replace the settings wholesale; returns the updated wallet
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> impl IntoResponse {
    info!("PUT /api/settings - settings: {:?}", settings);
    match state.wallet_service.update_settings(settings).await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
