//! # Wallet Store
//!
//! Persistent player → wallet address links.
//!
//! A link is the player's claim "my items belong to this address", established
//! only by the explicit `/linkwallet` command. The store guarantees that once
//! `link()` returns, the link survives a process crash, and that re-linking
//! overwrites the previous address (last committed wins).
//!
//! Lookups are pure in-memory index reads; the log is only touched on writes
//! and at startup recovery.

use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use emberlink_core::{PlayerId, WalletAddress};

use crate::error::{StoreError, StoreResult};
use crate::logfile::LogFile;

/// Magic bytes identifying a wallet log file.
const WALLET_MAGIC: &[u8; 4] = b"EWLT";

/// Current wallet log format version.
const WALLET_VERSION: u32 = 1;

/// One active wallet link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletLink {
    /// Player the link belongs to.
    pub player: PlayerId,
    /// Linked wallet address.
    pub address: WalletAddress,
    /// Unix timestamp (seconds) when the link was committed.
    pub linked_at: u64,
}

impl WalletLink {
    /// Serializes the link to a log record payload.
    fn serialize(&self) -> Vec<u8> {
        let addr = self.address.as_str().as_bytes();
        let mut buf = Vec::with_capacity(16 + 8 + 2 + addr.len());
        buf.extend_from_slice(&self.player.to_bytes());
        buf.extend_from_slice(&self.linked_at.to_le_bytes());
        buf.extend_from_slice(&(addr.len() as u16).to_le_bytes());
        buf.extend_from_slice(addr);
        buf
    }

    /// Deserializes a link from a log record payload.
    fn deserialize(payload: &[u8], path: &Path) -> StoreResult<Self> {
        let bad = |reason| StoreError::BadRecord {
            path: path.to_path_buf(),
            reason,
        };

        if payload.len() < 26 {
            return Err(bad("wallet record too short"));
        }

        let player_bytes: [u8; 16] = payload[0..16]
            .try_into()
            .map_err(|_| bad("wallet record player field"))?;
        let linked_at = u64::from_le_bytes(
            payload[16..24]
                .try_into()
                .map_err(|_| bad("wallet record timestamp field"))?,
        );
        let addr_len = u16::from_le_bytes(
            payload[24..26]
                .try_into()
                .map_err(|_| bad("wallet record length field"))?,
        ) as usize;

        if payload.len() != 26 + addr_len {
            return Err(bad("wallet record length mismatch"));
        }

        let addr_str = std::str::from_utf8(&payload[26..])
            .map_err(|_| bad("wallet record address not utf-8"))?;
        let address: WalletAddress = addr_str
            .parse()
            .map_err(|_| bad("wallet record address invalid"))?;

        Ok(Self {
            player: PlayerId::from_bytes(player_bytes),
            address,
            linked_at,
        })
    }
}

/// Durable player → wallet address store.
pub struct WalletStore {
    /// Append-only link log.
    log: LogFile,
    /// In-memory index, rebuilt from the log at startup.
    ///
    /// The write lock is held across the log append so that concurrent links
    /// commit to disk and to the index in the same order.
    index: RwLock<HashMap<PlayerId, WalletLink>>,
}

impl WalletStore {
    /// Opens or creates the wallet store at `path`, recovering all links.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let (log, payloads) = LogFile::open(path.as_ref(), WALLET_MAGIC, WALLET_VERSION)?;

        let mut index = HashMap::new();
        for payload in &payloads {
            let link = WalletLink::deserialize(payload, log.path())?;
            // Replay in write order: a later link for the same player wins
            index.insert(link.player, link);
        }

        if !index.is_empty() {
            tracing::info!(links = index.len(), "wallet store recovered");
        }

        Ok(Self {
            log,
            index: RwLock::new(index),
        })
    }

    /// Links (or re-links) a player to a wallet address.
    ///
    /// Address validation happens in [`WalletAddress`]'s parser before the
    /// store is ever involved. The link is on disk before this returns.
    pub fn link(&self, player: PlayerId, address: WalletAddress) -> StoreResult<()> {
        let link = WalletLink {
            player,
            address,
            linked_at: unix_now(),
        };

        let mut index = self.index.write();
        self.log.append(&link.serialize())?;
        index.insert(player, link);

        Ok(())
    }

    /// Returns the player's linked wallet address, if any.
    #[must_use]
    pub fn lookup(&self, player: PlayerId) -> Option<WalletAddress> {
        self.index.read().get(&player).map(|l| l.address.clone())
    }

    /// Returns the full link record for a player, if any.
    #[must_use]
    pub fn link_of(&self, player: PlayerId) -> Option<WalletLink> {
        self.index.read().get(&player).cloned()
    }

    /// Number of linked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Whether no player has linked a wallet yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }
}

/// Current unix time in seconds.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_store_path(tag: &str) -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("emberlink_wallet_{tag}_{id}.log"))
    }

    fn addr(last4: &str) -> WalletAddress {
        format!("0x{}{}", "0".repeat(36), last4).parse().unwrap()
    }

    #[test]
    fn test_link_and_lookup() {
        let path = temp_store_path("lookup");
        let store = WalletStore::open(&path).unwrap();
        let player = PlayerId::new(7);

        assert_eq!(store.lookup(player), None);
        store.link(player, addr("1234")).unwrap();
        assert_eq!(store.lookup(player), Some(addr("1234")));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_relink_overwrites() {
        let path = temp_store_path("relink");
        let store = WalletStore::open(&path).unwrap();
        let player = PlayerId::new(7);

        store.link(player, addr("1111")).unwrap();
        store.link(player, addr("2222")).unwrap();
        assert_eq!(store.lookup(player), Some(addr("2222")));
        assert_eq!(store.len(), 1);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_links_survive_reopen() {
        let path = temp_store_path("reopen");
        let player_a = PlayerId::new(1);
        let player_b = PlayerId::new(2);
        {
            let store = WalletStore::open(&path).unwrap();
            store.link(player_a, addr("aaaa")).unwrap();
            store.link(player_b, addr("bbbb")).unwrap();
            store.link(player_a, addr("cccc")).unwrap();
        }
        {
            let store = WalletStore::open(&path).unwrap();
            assert_eq!(store.len(), 2);
            // Last committed link wins after replay
            assert_eq!(store.lookup(player_a), Some(addr("cccc")));
            assert_eq!(store.lookup(player_b), Some(addr("bbbb")));
        }
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_link_record_roundtrip() {
        let link = WalletLink {
            player: PlayerId::new(99),
            address: addr("beef"),
            linked_at: 1_700_000_000,
        };
        let payload = link.serialize();
        let decoded = WalletLink::deserialize(&payload, Path::new("test")).unwrap();
        assert_eq!(decoded, link);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let link = WalletLink {
            player: PlayerId::new(99),
            address: addr("beef"),
            linked_at: 1,
        };
        let payload = link.serialize();
        let err = WalletLink::deserialize(&payload[..payload.len() - 1], Path::new("test"))
            .unwrap_err();
        assert!(matches!(err, StoreError::BadRecord { .. }));
    }
}
