//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! `wallet_config.yaml`, and `CLASSROOM_WALLET_*` environment variables.
//!
//! ```yaml
//! data_directory: /home/teacher/Documents/Classroom Wallet
//! remote_enabled: true
//! database_url: sqlite:///srv/wallet/wallet.db
//! collection: wallets
//! document_id: classroom_v1
//! bind_address: 127.0.0.1:3000
//! cors_origin: http://localhost:8080
//! poll_interval_ms: 2000
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "wallet_config.yaml";
pub const ENV_CONFIG: &str = "CLASSROOM_WALLET_CONFIG";
pub const ENV_DATA_DIR: &str = "CLASSROOM_WALLET_DATA_DIR";
pub const ENV_DATABASE_URL: &str = "CLASSROOM_WALLET_DATABASE_URL";
pub const ENV_BIND: &str = "CLASSROOM_WALLET_BIND";
pub const ENV_CORS_ORIGIN: &str = "CLASSROOM_WALLET_CORS_ORIGIN";
pub const ENV_POLL_MS: &str = "CLASSROOM_WALLET_POLL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the local wallet copy and the default database live
    pub data_directory: PathBuf,
    /// Use the database-backed store; when false only the local file is used
    pub remote_enabled: bool,
    /// Defaults to `wallet.db` in the data directory
    pub database_url: Option<String>,
    pub collection: String,
    pub document_id: String,
    pub bind_address: String,
    pub cors_origin: String,
    /// How often to check the database for outside changes, 0 disables
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            remote_enabled: true,
            database_url: None,
            collection: "wallets".to_string(),
            document_id: "classroom_v1".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            poll_interval_ms: 2000,
        }
    }
}

/// `~/Documents/Classroom Wallet`, or under the home directory when there is
/// no Documents folder
pub fn default_data_directory() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Classroom Wallet")
}

impl AppConfig {
    /// Load from the process environment and the optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();
        let path = match env(ENV_CONFIG) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|path| path.exists()),
        };
        Self::load_from(path.as_deref(), env)
    }

    /// Load from `path` (if any), then apply overrides looked up through `env`
    pub fn load_from<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_yaml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(ENV_DATA_DIR) {
            self.data_directory = PathBuf::from(dir);
        }
        if let Some(url) = env(ENV_DATABASE_URL) {
            // An empty URL switches the server to the local file store
            if url.trim().is_empty() {
                self.remote_enabled = false;
                self.database_url = None;
            } else {
                self.remote_enabled = true;
                self.database_url = Some(url);
            }
        }
        if let Some(bind) = env(ENV_BIND) {
            self.bind_address = bind;
        }
        if let Some(origin) = env(ENV_CORS_ORIGIN) {
            self.cors_origin = origin;
        }
        if let Some(poll) = env(ENV_POLL_MS) {
            self.poll_interval_ms =
                poll.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_POLL_MS.to_string(),
                        value: poll.clone(),
                    })?;
        }
        Ok(())
    }

    /// Database URL to connect to, `None` when the remote store is disabled
    pub fn effective_database_url(&self) -> Option<String> {
        if !self.remote_enabled {
            return None;
        }
        Some(self.database_url.clone().unwrap_or_else(|| {
            format!("sqlite://{}", self.data_directory.join("wallet.db").display())
        }))
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "bind_address".to_string(),
                value: self.bind_address.clone(),
            })
    }
}
