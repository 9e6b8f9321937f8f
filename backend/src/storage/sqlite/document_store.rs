//! SQLite-backed document store.
//!
//! Every document is one row of the `documents` table, keyed by collection and
//! id. The body is the JSON text of the document and `revision` is bumped on
//! every write so pollers can notice changes made by other processes.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::storage::error::StorageError;
use crate::storage::traits::{merge_fields, DocumentStore};

#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database at `url` and prepare the schema
    pub async fn connect(url: &str, collection: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("🗄️ Connected to document store at {} (collection '{}')", url, collection);

        Ok(Self {
            pool,
            collection: collection.to_string(),
        })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 1,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(self.collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.try_get("body")?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, id: &str, document: &Value) -> Result<(), StorageError> {
        let body = serde_json::to_string(document)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, revision, updated_at)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT (collection, id) DO UPDATE SET
                body = excluded.body,
                revision = documents.revision + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(self.collection.as_str())
        .bind(id)
        .bind(body)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn merge(&self, id: &str, fields: &Map<String, Value>) -> Result<(), StorageError> {
        let existing = self
            .load(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let merged = merge_fields(id, existing, fields)?;
        self.set(id, &merged).await
    }

    async fn revision(&self, id: &str) -> Result<Option<i64>, StorageError> {
        let row = sqlx::query("SELECT revision FROM documents WHERE collection = ? AND id = ?")
            .bind(self.collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("revision")?)),
            None => Ok(None),
        }
    }
}
