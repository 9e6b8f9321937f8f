//! # Storage Traits
//!
//! The wallet is a single JSON document. Both the SQLite store and the local
//! file fallback implement [`DocumentStore`], so the sync adapter can switch
//! between them without knowing which one it holds.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::StorageError;

/// A keyed collection of JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if it has never been written
    async fn load(&self, id: &str) -> Result<Option<Value>, StorageError>;

    /// Replace the whole document, creating it if needed
    async fn set(&self, id: &str, document: &Value) -> Result<(), StorageError>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// Plain read-modify-write: concurrent merges can overwrite each other.
    async fn merge(&self, id: &str, fields: &Map<String, Value>) -> Result<(), StorageError>;

    /// Opaque change marker; it differs after every write
    async fn revision(&self, id: &str) -> Result<Option<i64>, StorageError>;
}

/// Shared merge step: fold `fields` into a loaded document
pub(crate) fn merge_fields(
    id: &str,
    document: Value,
    fields: &Map<String, Value>,
) -> Result<Value, StorageError> {
    let Value::Object(mut existing) = document else {
        return Err(StorageError::NotAnObject(id.to_string()));
    };
    for (key, value) in fields {
        existing.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(existing))
}
