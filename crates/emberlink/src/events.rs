//! # Engine Event Boundary
//!
//! The narrow interface the host engine drives. The engine adapter (Hytale,
//! Bukkit, a test harness) translates its own callback types into these three
//! calls; nothing engine-specific crosses further in.
//!
//! Callbacks return immediately: they derive the event identifier, enqueue,
//! and hand the thread back to the engine. The `sequence` argument is the
//! engine's stable per-delivery number; redelivering a physical event with
//! the same sequence yields the same event identifier and is absorbed by the
//! ledger.

use emberlink_core::{Direction, PlayerId, RelayEvent};

use crate::plugin::EmberlinkPlugin;

/// Inventory callbacks the host engine delivers, possibly from many threads
/// at once.
pub trait InventorySink {
    /// Player picked up `amount` of `item`. Mints on chain.
    fn on_item_pickup(&self, player: PlayerId, item: &str, amount: u32, sequence: u64);

    /// Player consumed `amount` of `item`. Burns on chain.
    fn on_item_consume(&self, player: PlayerId, item: &str, amount: u32, sequence: u64);

    /// Player joined the world.
    fn on_player_join(&self, player: PlayerId);
}

impl InventorySink for EmberlinkPlugin {
    fn on_item_pickup(&self, player: PlayerId, item: &str, amount: u32, sequence: u64) {
        self.relay(player, item, amount, Direction::Mint, sequence);
    }

    fn on_item_consume(&self, player: PlayerId, item: &str, amount: u32, sequence: u64) {
        self.relay(player, item, amount, Direction::Burn, sequence);
    }

    fn on_player_join(&self, player: PlayerId) {
        match self.wallets().lookup(player) {
            Some(address) => {
                tracing::info!(%player, %address, "player joined with linked wallet");
            }
            None => {
                tracing::debug!(%player, "player joined without linked wallet");
            }
        }
    }
}

impl EmberlinkPlugin {
    /// Builds and enqueues one relay event.
    fn relay(&self, player: PlayerId, item: &str, amount: u32, direction: Direction, sequence: u64) {
        if amount == 0 {
            // Engines emit zero-amount updates for stack merges; nothing to
            // mint or burn
            tracing::debug!(%player, item, %direction, "ignoring zero-amount event");
            return;
        }
        let event = RelayEvent::new(player, item.to_string(), amount, direction, sequence);
        self.dispatcher().enqueue(event);
    }
}
