//! # Plugin Configuration
//!
//! One TOML file, loaded once at startup. Every malformation is fatal there:
//! the original sin this plugin exists to avoid is a token table that loads
//! half-way and silently mints the wrong thing.
//!
//! ```toml
//! [bridge]
//! base_url = "http://localhost:3000"
//! request_timeout_ms = 5000
//!
//! [relay]
//! workers = 2
//! queue_bound = 256
//! max_attempts = 3
//! backoff_base_ms = 50
//! backoff_cap_ms = 2000
//! shutdown_grace_ms = 5000
//!
//! [storage]
//! data_dir = "data/emberlink"
//!
//! [[tokens]]
//! item = "hytale:cheese"
//! token = 1
//!
//! [[tokens]]
//! item = "ore_copper"
//! token = 7
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use emberlink_bridge::BridgeConfig;
use emberlink_core::TokenId;
use emberlink_relay::{ItemTokenMap, RelayConfig, TokenMapError};

/// Errors from loading or validating configuration. All fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read config {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has wrong types. A negative
    /// token id lands here: token ids deserialize as `u64`.
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The token table is inconsistent.
    #[error(transparent)]
    TokenMap(#[from] TokenMapError),
}

/// `[bridge]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Base URL of the bridge service.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// `[relay]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    /// Number of dispatch workers.
    pub workers: usize,
    /// Bounded queue depth per worker.
    pub queue_bound: usize,
    /// Total delivery attempts per event.
    pub max_attempts: u32,
    /// First retry backoff in milliseconds.
    pub backoff_base_ms: u64,
    /// Backoff cap in milliseconds.
    pub backoff_cap_ms: u64,
    /// Shutdown grace in milliseconds.
    pub shutdown_grace_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_bound: 256,
            max_attempts: 3,
            backoff_base_ms: 50,
            backoff_cap_ms: 2000,
            shutdown_grace_ms: 5000,
        }
    }
}

/// `[storage]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for the wallet log and the event ledger.
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/emberlink"),
        }
    }
}

/// One `[[tokens]]` entry: engine item → chain token.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenEntry {
    /// Engine item identifier.
    pub item: String,
    /// Chain token identifier.
    pub token: TokenId,
}

/// Complete plugin configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmberlinkConfig {
    /// Bridge client settings.
    pub bridge: BridgeSection,
    /// Dispatcher settings.
    pub relay: RelaySection,
    /// Durable state settings.
    pub storage: StorageSection,
    /// Item → token table. An empty table is legal but logs a warning at
    /// startup since every event would drop.
    pub tokens: Vec<TokenEntry>,
}

impl EmberlinkConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Builds the bridge client configuration.
    #[must_use]
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            base_url: self.bridge.base_url.clone(),
            request_timeout: Duration::from_millis(self.bridge.request_timeout_ms),
        }
    }

    /// Builds the dispatcher configuration.
    #[must_use]
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            workers: self.relay.workers,
            queue_bound: self.relay.queue_bound,
            max_attempts: self.relay.max_attempts,
            backoff_base: Duration::from_millis(self.relay.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.relay.backoff_cap_ms),
            shutdown_grace: Duration::from_millis(self.relay.shutdown_grace_ms),
        }
    }

    /// Builds the item → token map, failing on duplicates.
    pub fn token_map(&self) -> Result<ItemTokenMap, ConfigError> {
        let map = ItemTokenMap::from_entries(
            self.tokens
                .iter()
                .map(|entry| (entry.item.clone(), entry.token)),
        )?;
        Ok(map)
    }
}
