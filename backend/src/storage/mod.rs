//! # Storage Layer
//!
//! Persistence of the wallet document:
//!
//! - [`sqlite`]: the shared document store, addressed by a database URL
//! - [`local`]: JSON files in the data directory, used as cache and fallback
//! - [`sync_adapter`]: keeps the in-memory snapshot and the stores in step
//! - [`events`]: typed broadcast of snapshots and save alerts

pub mod error;
pub mod events;
pub mod local;
pub mod sqlite;
pub mod sync_adapter;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use error::StorageError;
pub use events::{Subscription, WalletEvents};
pub use local::LocalDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use sync_adapter::{SyncAdapter, SyncError, LOCAL_DOCUMENT_ID, SAVE_FAILED_MESSAGE};
pub use traits::DocumentStore;
