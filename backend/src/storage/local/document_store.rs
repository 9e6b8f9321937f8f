//! File-backed document store used when no database is reachable.
//!
//! Each document is a pretty-printed JSON file in the data directory:
//!
//! ```text
//! {data directory}/
//! └── classroom_wallet_mock_data.json
//! ```
//!
//! Writes go to a temp file that is then renamed over the target, so a crash
//! mid-write leaves the previous version in place.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::info;

use crate::storage::error::StorageError;
use crate::storage::traits::{merge_fields, DocumentStore};

#[derive(Clone, Debug)]
pub struct LocalDocumentStore {
    base_directory: PathBuf,
}

impl LocalDocumentStore {
    /// Store rooted at `base_directory`, created if missing
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self, StorageError> {
        let base_directory = base_directory.as_ref().to_path_buf();
        if !base_directory.exists() {
            fs::create_dir_all(&base_directory)?;
            info!("Created data directory: {:?}", base_directory);
        }
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// File holding the document `id`
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.base_directory.join(format!("{}.json", sanitize_id(id)))
    }

    fn read_document(&self, id: &str) -> Result<Option<Value>, StorageError> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_document(&self, id: &str, document: &Value) -> Result<(), StorageError> {
        let path = self.document_path(id);
        let content = serde_json::to_string_pretty(document)?;

        // Atomic write: temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

/// Keep ids usable as file names
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Value>, StorageError> {
        self.read_document(id)
    }

    async fn set(&self, id: &str, document: &Value) -> Result<(), StorageError> {
        self.write_document(id, document)
    }

    async fn merge(&self, id: &str, fields: &Map<String, Value>) -> Result<(), StorageError> {
        let existing = self
            .read_document(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let merged = merge_fields(id, existing, fields)?;
        self.write_document(id, &merged)
    }

    async fn revision(&self, id: &str) -> Result<Option<i64>, StorageError> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let modified = fs::metadata(&path)?.modified()?;
        let millis = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Ok(Some(millis))
    }
}
