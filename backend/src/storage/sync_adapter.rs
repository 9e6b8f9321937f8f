//! Keeps the in-memory wallet in step with its persisted document.
//!
//! In remote mode the document lives in a [`DocumentStore`] shared with other
//! processes and every snapshot is also cached to the local store, which is
//! what reads fall back to when the remote store cannot be reached. In local
//! mode the local store is the only copy.
//!
//! Every document read passes through [`schema::upgrade`] and then the daily
//! class-earnings reset. Writes merge a [`WalletPatch`] into the stored
//! document with no version check: the last writer wins.

use serde_json::Value;
use shared::{StorageMode, WalletData, WalletEvent};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast::error::RecvError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::StorageError;
use super::events::{Subscription, WalletEvents};
use super::traits::DocumentStore;
use crate::domain::clock::Clock;
use crate::domain::models::WalletPatch;
use crate::domain::schema::{self, SchemaError};
use crate::domain::transaction_engine;

/// Id of the wallet record in the local store
pub const LOCAL_DOCUMENT_ID: &str = "classroom_wallet_mock_data";

/// Alert shown to the user when a remote write fails
pub const SAVE_FAILED_MESSAGE: &str =
    "Failed to save changes to cloud. Check internet connection.";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{message}")]
    RemoteWrite {
        message: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to load wallet document: {0}")]
    RemoteRead(#[source] StorageError),

    #[error("Local storage error: {0}")]
    Local(#[source] StorageError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to encode wallet: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct SyncAdapter {
    mode: StorageMode,
    remote: Option<Arc<dyn DocumentStore>>,
    local: Arc<dyn DocumentStore>,
    document_id: String,
    current: RwLock<WalletData>,
    events: WalletEvents,
    clock: Arc<dyn Clock>,
}

impl SyncAdapter {
    /// Adapter over a remote document, cached to `local`
    pub async fn remote(
        remote: Arc<dyn DocumentStore>,
        local: Arc<dyn DocumentStore>,
        document_id: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::open(StorageMode::Remote, Some(remote), local, document_id, clock).await
    }

    /// Adapter storing the wallet only in `local`
    pub async fn local(local: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self::open(StorageMode::Local, None, local, LOCAL_DOCUMENT_ID, clock).await
    }

    async fn open(
        mode: StorageMode,
        remote: Option<Arc<dyn DocumentStore>>,
        local: Arc<dyn DocumentStore>,
        document_id: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let today = clock.today();
        let adapter = Self {
            mode,
            remote,
            local,
            document_id: document_id.to_string(),
            current: RwLock::new(WalletData::initial(today)),
            events: WalletEvents::new(),
            clock,
        };

        let wallet = adapter.read_document().await;
        adapter.publish(wallet).await;
        info!("💾 Wallet storage ready ({:?} mode)", adapter.mode);
        adapter
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn events(&self) -> &WalletEvents {
        &self.events
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Last published snapshot
    pub async fn current(&self) -> WalletData {
        self.current.read().await.clone()
    }

    /// Last published snapshot with the daily reset applied first if the day
    /// has changed since it was written
    pub async fn snapshot(&self) -> Result<WalletData, SyncError> {
        let wallet = self.current().await;
        match transaction_engine::daily_reset(&wallet, self.clock.today()) {
            Some(patch) => {
                info!("🌅 New day, resetting class earnings");
                self.update(patch).await
            }
            None => Ok(wallet),
        }
    }

    /// Deliver the current snapshot to `callback` now and every later one as
    /// it is published
    pub async fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(WalletData) + Send + 'static,
    {
        let mut receiver = self.events.subscribe();
        callback(self.current().await);

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(WalletEvent::Snapshot(wallet)) => callback(wallet),
                    Ok(WalletEvent::SaveFailed { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Wallet subscriber lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription::new(handle)
    }

    /// Persist a partial update, then publish the stored result
    pub async fn update(&self, patch: WalletPatch) -> Result<WalletData, SyncError> {
        if patch.is_empty() {
            return Ok(self.current().await);
        }

        self.write_patch(&patch).await?;

        let wallet = match self.reload().await {
            Ok(wallet) => wallet,
            Err(e) => {
                warn!("⚠️ Could not re-read wallet after saving: {}", e);
                let mut wallet = self.current().await;
                patch.apply_to(&mut wallet);
                wallet
            }
        };

        self.publish(wallet.clone()).await;
        Ok(wallet)
    }

    /// Replace the whole wallet with the initial state
    pub async fn reset(&self) -> Result<WalletData, SyncError> {
        let wallet = WalletData::initial(self.clock.today());
        let document = serde_json::to_value(&wallet)?;

        match &self.remote {
            Some(remote) => {
                if let Err(source) = remote.set(&self.document_id, &document).await {
                    return Err(self.remote_write_failed(source));
                }
            }
            None => self
                .local
                .set(LOCAL_DOCUMENT_ID, &document)
                .await
                .map_err(SyncError::Local)?,
        }

        info!("🔄 Wallet reset to initial state");
        self.publish(wallet.clone()).await;
        Ok(wallet)
    }

    /// Re-read the document and publish it if it differs from the current one
    pub async fn refresh(&self) -> WalletData {
        let wallet = self.read_document().await;
        if wallet != *self.current.read().await {
            debug!("Wallet document changed outside this process");
            self.publish(wallet.clone()).await;
        }
        wallet
    }

    /// Poll the remote revision and refresh when it moves or the day changes.
    /// Returns `None` in local mode, where every change is made in-process.
    pub fn spawn_watch(self: Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;

        Some(tokio::spawn(async move {
            let mut last_revision = remote.revision(&self.document_id).await.ok().flatten();
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let day_changed =
                    self.current.read().await.last_active_date != self.clock.today();

                match remote.revision(&self.document_id).await {
                    Ok(revision) if revision != last_revision || day_changed => {
                        last_revision = revision;
                        self.refresh().await;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Wallet revision poll failed: {}", e),
                }
            }
        }))
    }

    async fn read_document(&self) -> WalletData {
        let today = self.clock.today();

        let wallet = match self.mode {
            StorageMode::Remote => match self.load_remote().await {
                Ok(wallet) => wallet,
                Err(e) => {
                    warn!("⚠️ Remote wallet unavailable, using local cache: {}", e);
                    let mut wallet = self.load_local().await;
                    if let Some(patch) = transaction_engine::daily_reset(&wallet, today) {
                        patch.apply_to(&mut wallet);
                    }
                    return wallet;
                }
            },
            StorageMode::Local => self.load_local().await,
        };

        self.settle_day(wallet).await
    }

    /// Persist and apply the daily reset when the document is from another day
    async fn settle_day(&self, mut wallet: WalletData) -> WalletData {
        if let Some(patch) = transaction_engine::daily_reset(&wallet, self.clock.today()) {
            info!("🌅 New day, resetting class earnings");
            if let Err(e) = self.write_patch(&patch).await {
                warn!("⚠️ Daily reset was not saved: {}", e);
            }
            patch.apply_to(&mut wallet);
        }
        wallet
    }

    /// Stored document as written, without the daily reset
    async fn reload(&self) -> Result<WalletData, SyncError> {
        match self.mode {
            StorageMode::Remote => self.load_remote().await,
            StorageMode::Local => Ok(self.load_local().await),
        }
    }

    /// Fetch the remote document, seeding it with the initial state if missing
    async fn load_remote(&self) -> Result<WalletData, SyncError> {
        let today = self.clock.today();
        let Some(remote) = &self.remote else {
            return Ok(self.load_local().await);
        };

        let loaded = remote
            .load(&self.document_id)
            .await
            .map_err(SyncError::RemoteRead)?;

        match loaded {
            Some(document) => Ok(schema::upgrade(document, today)?),
            None => {
                info!("🌱 No wallet document yet, creating initial state");
                let wallet = WalletData::initial(today);
                if let Err(source) = remote
                    .set(&self.document_id, &serde_json::to_value(&wallet)?)
                    .await
                {
                    return Err(self.remote_write_failed(source));
                }
                Ok(wallet)
            }
        }
    }

    /// Local copy of the wallet; anything missing or unreadable yields the
    /// initial state
    async fn load_local(&self) -> WalletData {
        let today = self.clock.today();
        match self.local.load(LOCAL_DOCUMENT_ID).await {
            Ok(Some(document)) => match schema::upgrade(document, today) {
                Ok(wallet) => wallet,
                Err(e) => {
                    warn!("⚠️ Local wallet copy is unreadable, starting fresh: {}", e);
                    WalletData::initial(today)
                }
            },
            Ok(None) => WalletData::initial(today),
            Err(e) => {
                warn!("⚠️ Failed to read local wallet copy: {}", e);
                WalletData::initial(today)
            }
        }
    }

    async fn write_patch(&self, patch: &WalletPatch) -> Result<(), SyncError> {
        match &self.remote {
            Some(remote) => {
                let fields = patch.to_fields()?;
                remote
                    .merge(&self.document_id, &fields)
                    .await
                    .map_err(|source| self.remote_write_failed(source))
            }
            None => {
                let mut wallet = self.load_local().await;
                patch.apply_to(&mut wallet);
                self.local
                    .set(LOCAL_DOCUMENT_ID, &serde_json::to_value(&wallet)?)
                    .await
                    .map_err(SyncError::Local)
            }
        }
    }

    fn remote_write_failed(&self, source: StorageError) -> SyncError {
        error!("❌ Failed to save wallet to remote store: {}", source);
        self.events.publish_alert(SAVE_FAILED_MESSAGE);
        SyncError::RemoteWrite {
            message: SAVE_FAILED_MESSAGE.to_string(),
            source,
        }
    }

    async fn publish(&self, wallet: WalletData) {
        *self.current.write().await = wallet.clone();

        if self.mode == StorageMode::Remote {
            if let Err(e) = self.cache_locally(&wallet).await {
                warn!("⚠️ Failed to cache wallet locally: {}", e);
            }
        }

        let delivered = self.events.publish_snapshot(wallet);
        debug!("Published wallet snapshot to {} subscribers", delivered);
    }

    async fn cache_locally(&self, wallet: &WalletData) -> Result<(), StorageError> {
        let document: Value = serde_json::to_value(wallet)?;
        self.local.set(LOCAL_DOCUMENT_ID, &document).await
    }
}
