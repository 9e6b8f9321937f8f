//! Error responses for the REST layer.
//!
//! Every failure is returned as `{"error": message, "status": code}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, info};

use crate::domain::WalletError;
use crate::storage::SyncError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Wallet(e) => match e {
                WalletError::InvalidAmount(_)
                | WalletError::InsufficientFunds(_)
                | WalletError::ClassLimitReached { .. }
                | WalletError::InvalidSettings(_)
                | WalletError::NoClasses => StatusCode::BAD_REQUEST,
                WalletError::UnknownClass(_) | WalletError::UnknownShopItem(_) => {
                    StatusCode::NOT_FOUND
                }
                WalletError::Sync(
                    SyncError::RemoteWrite { .. } | SyncError::RemoteRead(_) | SyncError::Local(_),
                ) => StatusCode::SERVICE_UNAVAILABLE,
                WalletError::Sync(_) | WalletError::Export(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("❌ Request failed ({}): {}", status.as_u16(), message);
        } else {
            info!("🚫 Request rejected ({}): {}", status.as_u16(), message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
