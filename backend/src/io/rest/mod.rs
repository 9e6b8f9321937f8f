//! # REST API Interface Layer
//!
//! HTTP endpoints for the classroom wallet, all under `/api`:
//!
//! | Method | Path | Action |
//! |---|---|---|
//! | GET | `/wallet` | current snapshot |
//! | GET | `/wallet/dashboard?class=` | dashboard view |
//! | POST | `/wallet/earn`, `/wallet/spend`, `/wallet/purchase` | transactions |
//! | POST | `/wallet/start-class`, `/wallet/reset` | class start, full reset |
//! | GET | `/wallet/ws` | WebSocket event stream |
//! | POST | `/bank/deposit`, `/bank/withdraw` | savings bank |
//! | GET, PUT | `/settings` | read / replace settings |
//! | GET | `/history/export` | CSV export |
//! | POST | `/history/import` | CSV import |
//! | GET | `/timer` | countdown status |
//! | POST | `/timer/stop` | stop the countdown |
//!
//! Handlers only translate between HTTP and the wallet service; domain errors
//! become JSON error bodies through [`ApiError`].

pub mod bank_apis;
pub mod error;
pub mod export_apis;
pub mod settings_apis;
pub mod timer_apis;
pub mod wallet_apis;
pub mod ws;

use axum::Router;

pub use error::ApiError;

use crate::AppState;

/// All `/api` routes, before state is attached
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(wallet_apis::router())
        .merge(bank_apis::router())
        .merge(settings_apis::router())
        .merge(export_apis::router())
        .merge(timer_apis::router())
}
