//! # REST API for the Screen-Time Countdown

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/timer", get(get_timer))
        .route("/timer/stop", post(stop_timer))
}

pub async fn get_timer(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.wallet_service.timer_status().await)
}

pub async fn stop_timer(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/timer/stop");
    Json(state.wallet_service.stop_timer().await)
}
