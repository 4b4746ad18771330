//! # Plugin Wiring
//!
//! Constructs every component once and owns them for the process lifetime.
//! There is deliberately no global state: the plugin instance is the only
//! handle, and everything it holds was injected at construction.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use emberlink_bridge::{BridgeApi, BridgeError, HttpBridgeClient};
use emberlink_relay::RelayDispatcher;
use emberlink_store::{EventLedger, StoreError, WalletStore};

use crate::config::{ConfigError, EmberlinkConfig};

/// File name of the wallet link log inside the data directory.
const WALLET_LOG: &str = "wallets.log";

/// File name of the processed-event ledger inside the data directory.
const EVENT_LEDGER: &str = "events.log";

/// Errors from plugin construction. All fatal at startup.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Configuration was malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Durable state could not be opened or recovered.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP client could not be built.
    #[error("bridge client setup failed: {0}")]
    Bridge(#[from] BridgeError),

    /// The data directory could not be created.
    #[error("could not create data directory {path}: {source}")]
    DataDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },
}

/// The assembled plugin.
pub struct EmberlinkPlugin {
    wallets: Arc<WalletStore>,
    bridge: Arc<dyn BridgeApi>,
    dispatcher: RelayDispatcher,
}

impl EmberlinkPlugin {
    /// Builds the plugin with the production HTTP bridge client.
    pub fn new(config: &EmberlinkConfig) -> Result<Self, PluginError> {
        let bridge: Arc<dyn BridgeApi> = Arc::new(HttpBridgeClient::new(&config.bridge_config())?);
        Self::with_bridge(config, bridge)
    }

    /// Builds the plugin around an injected bridge implementation.
    ///
    /// This is the seam tests and alternative transports use; everything else
    /// is constructed exactly as in [`Self::new`].
    pub fn with_bridge(
        config: &EmberlinkConfig,
        bridge: Arc<dyn BridgeApi>,
    ) -> Result<Self, PluginError> {
        let data_dir = &config.storage.data_dir;
        std::fs::create_dir_all(data_dir).map_err(|source| PluginError::DataDir {
            path: data_dir.clone(),
            source,
        })?;

        let wallets = Arc::new(WalletStore::open(data_dir.join(WALLET_LOG))?);
        let ledger = Arc::new(EventLedger::open(data_dir.join(EVENT_LEDGER))?);
        let tokens = Arc::new(config.token_map()?);

        if tokens.is_empty() {
            tracing::warn!("token table is empty: every inventory event will drop");
        }

        let dispatcher = RelayDispatcher::new(
            config.relay_config(),
            Arc::clone(&wallets),
            Arc::clone(&ledger),
            tokens,
            Arc::clone(&bridge),
        );

        tracing::info!(
            bridge_url = %config.bridge.base_url,
            tracked_items = config.tokens.len(),
            linked_wallets = wallets.len(),
            "emberlink enabled"
        );

        Ok(Self {
            wallets,
            bridge,
            dispatcher,
        })
    }

    /// The wallet store.
    #[must_use]
    pub fn wallets(&self) -> &WalletStore {
        &self.wallets
    }

    /// The bridge client.
    #[must_use]
    pub fn bridge(&self) -> &dyn BridgeApi {
        self.bridge.as_ref()
    }

    /// The relay dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &RelayDispatcher {
        &self.dispatcher
    }

    /// Stops the dispatcher, draining in-flight work within the configured
    /// grace period. Idempotent.
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
        tracing::info!("emberlink disabled");
    }
}
