//! # REST API for the Savings Bank

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use shared::BankRequest;
use tracing::info;

use super::error::ApiError;
use crate::domain::BankAction;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bank/deposit", post(deposit))
        .route("/bank/withdraw", post(withdraw))
}

pub async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<BankRequest>,
) -> impl IntoResponse {
    info!("POST /api/bank/deposit - amount: {:?}", request.amount);
    bank_action(state, BankAction::Deposit, request).await
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(request): Json<BankRequest>,
) -> impl IntoResponse {
    info!("POST /api/bank/withdraw - amount: {:?}", request.amount);
    bank_action(state, BankAction::Withdraw, request).await
}

/// An ignored amount still answers 200 with `applied: false`
async fn bank_action(
    state: AppState,
    action: BankAction,
    request: BankRequest,
) -> axum::response::Response {
    match state
        .wallet_service
        .bank_response(action, &request.amount, request.class_name.as_deref())
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
