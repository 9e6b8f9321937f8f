//! # Domain Layer
//!
//! Wallet rules and the services built on them:
//!
//! - [`transaction_engine`]: pure balance updates, the daily reset and the
//!   command reducer
//! - [`schema`]: upgrade of stored documents to the current shape
//! - [`wallet_service`]: user actions with their pre-checks
//! - [`dashboard`], [`export_service`], [`timer_service`]: derived views, CSV
//!   import/export and the screen-time countdown

pub mod clock;
pub mod dashboard;
pub mod export_service;
pub mod models;
pub mod schema;
pub mod timer_service;
pub mod transaction_engine;
pub mod wallet_service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dashboard::DashboardService;
pub use export_service::ExportService;
pub use models::{WalletCommand, WalletPatch};
pub use timer_service::ScreenTimeTimer;
pub use wallet_service::{Account, BankAction, BankOutcome, WalletError, WalletService};
