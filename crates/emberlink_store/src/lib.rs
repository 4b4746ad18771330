//! # EMBERLINK Durable State
//!
//! Crash-safe storage for the two facts the plugin must never lose:
//!
//! - **WalletStore** - which wallet address a player linked. Losing this after
//!   acknowledging `/linkwallet` would silently stop syncing their items.
//! - **EventLedger** - which event identifiers have already been committed to
//!   the bridge. Losing this would double-mint on redelivery.
//!
//! ## Durability Model
//!
//! Both stores are append-only log files with CRC32-framed records:
//!
//! ```text
//! [4 bytes: magic]
//! [4 bytes: format version]
//!
//! Record format:
//! [4 bytes: payload length]
//! [N bytes: payload]
//! [4 bytes: CRC32 of length + payload]
//! ```
//!
//! A write is acknowledged only after `fsync`. Recovery replays records in
//! order and truncates at the first torn or corrupt record, which is the
//! standard crash outcome for an append-only log: everything acknowledged
//! before the crash survives.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod logfile;

pub mod error;
pub mod ledger;
pub mod wallet;

pub use error::{StoreError, StoreResult};
pub use ledger::EventLedger;
pub use wallet::{WalletLink, WalletStore};
