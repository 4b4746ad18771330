//! # EMBERLINK
//!
//! Sync game inventory events to a blockchain token bridge.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  callbacks   ┌─────────────────┐
//! │  Host Engine    │ ───────────▶ │ EmberlinkPlugin │
//! │  (any threads)  │  commands    │                 │
//! └─────────────────┘              │  WalletStore    │
//!                                  │  EventLedger    │
//!                                  │  ItemTokenMap   │
//!                                  │  RelayDispatcher│──▶ Bridge Service
//!                                  └─────────────────┘      (HTTP)
//! ```
//!
//! The plugin owns every component; nothing is global. Construction happens
//! once at startup from [`EmberlinkConfig`], and a malformed configuration is
//! fatal there - a token table that silently half-loads would mint the wrong
//! tokens.
//!
//! ## Delivery Contract
//!
//! Inventory callbacks enqueue and return. Delivery to the bridge is
//! at-least-once with a content-derived event identifier; the processed-event
//! ledger and the remote's own deduplication together make the observable
//! effect exactly-once.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod commands;
pub mod config;
pub mod events;
pub mod plugin;

pub use commands::{checkinventory, linkwallet};
pub use config::{ConfigError, EmberlinkConfig};
pub use events::InventorySink;
pub use plugin::{EmberlinkPlugin, PluginError};
