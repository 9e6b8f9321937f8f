//! Test utilities for storage and service tests.
//!
//! [`TestEnvironment`] owns a temporary directory that is removed when the
//! environment is dropped, even if the test panics. [`MemoryDocumentStore`]
//! stands in for a remote store whose reads and writes can be made to fail.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::error::StorageError;
use super::local::LocalDocumentStore;
use super::traits::{merge_fields, DocumentStore};
use crate::domain::clock::{Clock, FixedClock};

pub struct TestEnvironment {
    pub base_path: PathBuf,
    pub clock: Arc<FixedClock>,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::starting_on(NaiveDate::from_ymd_opt(2024, 9, 2).expect("valid date"))
    }

    pub fn starting_on(today: NaiveDate) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            base_path: temp_dir.path().to_path_buf(),
            clock: Arc::new(FixedClock::new(today)),
            _temp_dir: temp_dir,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn local_store(&self) -> Arc<LocalDocumentStore> {
        Arc::new(LocalDocumentStore::new(&self.base_path).expect("Failed to create local store"))
    }
}

/// In-memory document store with switchable failures
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, (Value, i64)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Write a document directly, as another client would
    pub fn insert(&self, id: &str, document: Value) {
        let mut documents = self.documents.lock().expect("store lock");
        let revision = documents.get(id).map(|(_, rev)| rev + 1).unwrap_or(1);
        documents.insert(id.to_string(), (document, revision));
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        let documents = self.documents.lock().expect("store lock");
        documents.get(id).map(|(document, _)| document.clone())
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Value>, StorageError> {
        self.check(&self.fail_reads)?;
        Ok(self.document(id))
    }

    async fn set(&self, id: &str, document: &Value) -> Result<(), StorageError> {
        self.check(&self.fail_writes)?;
        self.insert(id, document.clone());
        Ok(())
    }

    async fn merge(&self, id: &str, fields: &Map<String, Value>) -> Result<(), StorageError> {
        self.check(&self.fail_writes)?;
        let existing = self
            .document(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        self.insert(id, merge_fields(id, existing, fields)?);
        Ok(())
    }

    async fn revision(&self, id: &str) -> Result<Option<i64>, StorageError> {
        self.check(&self.fail_reads)?;
        let documents = self.documents.lock().expect("store lock");
        Ok(documents.get(id).map(|(_, revision)| *revision))
    }
}
