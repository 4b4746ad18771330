//! # Item → Token Map
//!
//! Static mapping from engine item identifiers to chain token identifiers.
//! Built once from configuration at startup, immutable for the process
//! lifetime. A duplicate item mapping is a *fatal* configuration error, not a
//! silent overwrite: two entries disagreeing about an item's token would mint
//! one token and burn another.

use std::collections::HashMap;

use thiserror::Error;

use emberlink_core::TokenId;

/// Errors from building the item → token map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenMapError {
    /// The same item identifier appeared in two entries.
    #[error("duplicate token mapping for item {0:?}")]
    DuplicateItem(String),
}

/// Immutable engine item → chain token mapping.
#[derive(Debug, Default)]
pub struct ItemTokenMap {
    /// Entries, frozen after construction.
    entries: HashMap<String, TokenId>,
}

impl ItemTokenMap {
    /// Builds the map from configuration entries.
    ///
    /// Fails on a duplicate item identifier; callers treat that as fatal at
    /// startup.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, TokenId)>,
    ) -> Result<Self, TokenMapError> {
        let mut map = HashMap::new();
        for (item, token) in entries {
            if map.insert(item.clone(), token).is_some() {
                return Err(TokenMapError::DuplicateItem(item));
            }
        }
        Ok(Self { entries: map })
    }

    /// Returns the chain token for an engine item, if the item is tracked.
    #[inline]
    #[must_use]
    pub fn token_for(&self, item: &str) -> Option<TokenId> {
        self.entries.get(item).copied()
    }

    /// Number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no item is tracked (every event would drop).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
