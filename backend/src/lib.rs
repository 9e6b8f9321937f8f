//! # Classroom Wallet Backend
//!
//! Contains all non-UI logic for the classroom wallet.
//!
//! The backend follows a layered architecture:
//! ```text
//! HTTP clients (browser, WebSocket)
//!     ↓
//! IO Layer (REST API, WebSocket stream)
//!     ↓
//! Domain Layer (wallet rules, services)
//!     ↓
//! Storage Layer (document stores, sync adapter)
//! ```
//!
//! [`initialize_backend`] wires the layers together from an [`AppConfig`] and
//! [`create_router`] exposes them over HTTP.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub use config::AppConfig;
use domain::{Clock, ScreenTimeTimer, SystemClock, WalletService};
use storage::{DocumentStore, LocalDocumentStore, SqliteDocumentStore, SyncAdapter};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub wallet_service: WalletService,
    pub sync_adapter: Arc<SyncAdapter>,
}

impl AppState {
    pub fn new(sync_adapter: Arc<SyncAdapter>, timer: ScreenTimeTimer) -> Self {
        Self {
            wallet_service: WalletService::new(Arc::clone(&sync_adapter), timer),
            sync_adapter,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    initialize_backend_with_clock(config, Arc::new(SystemClock)).await
}

pub async fn initialize_backend_with_clock(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> Result<AppState> {
    info!("📁 Using data directory {:?}", config.data_directory);
    let local: Arc<dyn DocumentStore> = Arc::new(
        LocalDocumentStore::new(&config.data_directory)
            .with_context(|| format!("Failed to open data directory {:?}", config.data_directory))?,
    );

    info!("Setting up wallet storage");
    let remote = match config.effective_database_url() {
        Some(url) => match SqliteDocumentStore::connect(&url, &config.collection).await {
            Ok(store) => Some(Arc::new(store) as Arc<dyn DocumentStore>),
            Err(e) => {
                warn!("⚠️ Document store unavailable ({}), running in local mode", e);
                None
            }
        },
        None => {
            info!("No database configured, running in local mode");
            None
        }
    };

    let sync_adapter = Arc::new(match remote {
        Some(remote) => SyncAdapter::remote(remote, local, &config.document_id, clock).await,
        None => SyncAdapter::local(local, clock).await,
    });

    if let Some(interval) = config.poll_interval() {
        if Arc::clone(&sync_adapter).spawn_watch(interval).is_some() {
            info!("👀 Watching wallet document every {:?}", interval);
        }
    }

    info!("Setting up application state");
    Ok(AppState::new(sync_adapter, ScreenTimeTimer::new()))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => cors.allow_origin(origin),
        _ => cors.allow_origin(Any),
    };

    Router::new()
        .nest("/api", io::api_router())
        .layer(cors)
        .with_state(app_state)
}
