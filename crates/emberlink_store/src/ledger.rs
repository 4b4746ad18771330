//! # Processed-Event Ledger
//!
//! Durable set of event identifiers that reached `Committed`.
//!
//! The bridge is called at-least-once; this ledger is what turns redelivery of
//! an already-committed event into a no-op instead of a double mint. An event
//! identifier is recorded *after* the bridge accepted the call and *before*
//! the event is reported committed, so a crash between the two re-dispatches
//! the event and the remote's own eventId deduplication absorbs it.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::RwLock;

use emberlink_core::EventId;

use crate::error::{StoreError, StoreResult};
use crate::logfile::LogFile;

/// Magic bytes identifying a ledger file.
const LEDGER_MAGIC: &[u8; 4] = b"ELDG";

/// Current ledger format version.
const LEDGER_VERSION: u32 = 1;

/// Durable set of committed event identifiers.
pub struct EventLedger {
    /// Append-only identifier log.
    log: LogFile,
    /// In-memory set, rebuilt from the log at startup.
    seen: RwLock<HashSet<EventId>>,
}

impl EventLedger {
    /// Opens or creates the ledger at `path`, recovering all identifiers.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let (log, payloads) = LogFile::open(path.as_ref(), LEDGER_MAGIC, LEDGER_VERSION)?;

        let mut seen = HashSet::with_capacity(payloads.len());
        for payload in &payloads {
            let bytes: [u8; 16] = payload.as_slice().try_into().map_err(|_| {
                StoreError::BadRecord {
                    path: log.path().to_path_buf(),
                    reason: "ledger record must be 16 bytes",
                }
            })?;
            seen.insert(EventId::from_raw(u128::from_le_bytes(bytes)));
        }

        if !seen.is_empty() {
            tracing::info!(events = seen.len(), "event ledger recovered");
        }

        Ok(Self {
            log,
            seen: RwLock::new(seen),
        })
    }

    /// Whether this event identifier was already committed.
    #[must_use]
    pub fn contains(&self, event_id: EventId) -> bool {
        self.seen.read().contains(&event_id)
    }

    /// Durably records a committed event identifier.
    ///
    /// The identifier is on disk before this returns. Recording the same
    /// identifier twice is harmless (the set absorbs it on replay).
    pub fn record(&self, event_id: EventId) -> StoreResult<()> {
        let mut seen = self.seen.write();
        self.log.append(&event_id.raw().to_le_bytes())?;
        seen.insert(event_id);
        Ok(())
    }

    /// Number of committed events on record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.read().len()
    }

    /// Whether no event has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.read().is_empty()
    }
}
