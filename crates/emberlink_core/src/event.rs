//! # Relay Events & Idempotency Keys
//!
//! A [`RelayEvent`] is our internal record of one physical game event (a
//! pickup or a consume). Its [`EventId`] is derived from the event content
//! plus the engine's delivery sequence number, so:
//!
//! - Redelivery of the *same* physical event hashes to the *same* key, and the
//!   processed-event ledger turns it into a no-op.
//! - Two physically distinct events with identical content (same player picks
//!   up the same stack twice) differ in sequence number and get distinct keys.
//!
//! SipHash-2-4 with fixed keys gives us a cheap, well-distributed 128-bit
//! digest; this is an idempotency key, not a security boundary.

use std::fmt;
use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher24};

use crate::identity::PlayerId;

/// Unique identifier for a token type on the target chain.
pub type TokenId = u64;

/// Fixed SipHash keys for event identifier derivation.
///
/// These must never change for a deployed world: the processed-event ledger
/// stores derived keys, and changing the keys would re-open every event.
const EVENT_KEY_0: u64 = 0x454d_4245_524c_494e; // "EMBERLIN"
const EVENT_KEY_1: u64 = 0x4b5f_4556_454e_5431; // "K_EVENT1"

/// Whether an event mints tokens to the player or burns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Item entered the player's inventory - mint on chain.
    Mint = 0,
    /// Item left the player's inventory - burn on chain.
    Burn = 1,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => f.write_str("mint"),
            Self::Burn => f.write_str("burn"),
        }
    }
}

/// Content-derived idempotency key for one physical game event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u128);

impl EventId {
    /// Derives the identifier for one physical event.
    ///
    /// # Arguments
    ///
    /// * `player` - The player the event belongs to
    /// * `item` - Engine item identifier (e.g. `"hytale:cheese"`)
    /// * `direction` - Mint or burn
    /// * `amount` - Item count
    /// * `sequence` - Engine-issued delivery sequence number, stable across
    ///   redelivery of the same physical event
    #[must_use]
    pub fn derive(
        player: PlayerId,
        item: &str,
        direction: Direction,
        amount: u32,
        sequence: u64,
    ) -> Self {
        let mut hasher = SipHasher24::new_with_keys(EVENT_KEY_0, EVENT_KEY_1);

        hasher.write(&player.to_bytes());
        // Length prefix keeps field boundaries unambiguous
        hasher.write_u64(item.len() as u64);
        hasher.write(item.as_bytes());
        hasher.write_u8(direction as u8);
        hasher.write_u32(amount);
        hasher.write_u64(sequence);

        Self(hasher.finish128().as_u128())
    }

    /// Creates an identifier from its raw 128-bit value (ledger recovery).
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Returns the raw 128-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// One physical game event, owned by the relay for the duration of one
/// delivery attempt chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayEvent {
    /// Player the event belongs to.
    pub player: PlayerId,
    /// Engine item identifier.
    pub item_id: String,
    /// Item count (always positive; zero-amount events are never emitted).
    pub amount: u32,
    /// Mint or burn.
    pub direction: Direction,
    /// Idempotency key for this physical event.
    pub event_id: EventId,
}

impl RelayEvent {
    /// Builds a relay event, deriving its idempotency key.
    #[must_use]
    pub fn new(
        player: PlayerId,
        item_id: String,
        amount: u32,
        direction: Direction,
        sequence: u64,
    ) -> Self {
        let event_id = EventId::derive(player, &item_id, direction, amount, sequence);
        Self {
            player,
            item_id,
            amount,
            direction,
            event_id,
        }
    }
}
