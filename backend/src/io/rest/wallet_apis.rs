//! # REST API for Wallet Actions
//!
//! Snapshot, dashboard, earning, spending, shop purchases, class start and
//! reset.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use shared::{EarnRequest, PurchaseRequest, SpendRequest, StartClassRequest};
use tracing::info;

use super::error::ApiError;
use super::ws::wallet_ws;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub class: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_wallet))
        .route("/wallet/dashboard", get(get_dashboard))
        .route("/wallet/earn", post(earn))
        .route("/wallet/spend", post(spend))
        .route("/wallet/purchase", post(purchase))
        .route("/wallet/start-class", post(start_class))
        .route("/wallet/reset", post(reset_wallet))
        .route("/wallet/ws", get(wallet_ws))
}

/// Current wallet document
pub async fn get_wallet(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/wallet");
    match state.wallet_service.wallet().await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Everything the wallet screen shows for the selected class
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    info!("GET /api/wallet/dashboard - class: {:?}", query.class);
    match state.wallet_service.dashboard(query.class.as_deref()).await {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn earn(
    State(state): State<AppState>,
    Json(request): Json<EarnRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/earn - request: {:?}", request);
    match state.wallet_service.earn(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn spend(
    State(state): State<AppState>,
    Json(request): Json<SpendRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/spend - request: {:?}", request);
    match state.wallet_service.spend(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Buy a shop item; starts the screen-time countdown
pub async fn purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/purchase - request: {:?}", request);
    match state.wallet_service.purchase(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn start_class(
    State(state): State<AppState>,
    Json(request): Json<StartClassRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/start-class - request: {:?}", request);
    match state.wallet_service.start_class(request).await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn reset_wallet(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/wallet/reset");
    match state.wallet_service.reset().await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
