//! # Player Commands
//!
//! Thin adapters between chat commands and the components. Replies are one
//! line of plain text; the engine adapter sends them back verbatim. A bridge
//! or storage failure becomes a message, never a panic, and never interrupts
//! gameplay.

use emberlink_core::{PlayerId, WalletAddress};

use crate::plugin::EmberlinkPlugin;

/// `/linkwallet <address>` - link (or re-link) the caller's wallet.
///
/// Validation happens before anything is stored: an invalid address leaves a
/// prior link untouched.
pub fn linkwallet(plugin: &EmberlinkPlugin, player: PlayerId, address_arg: &str) -> String {
    let address: WalletAddress = match address_arg.trim().parse() {
        Ok(address) => address,
        Err(e) => return format!("Invalid wallet address: {e}"),
    };

    match plugin.wallets().link(player, address.clone()) {
        Ok(()) => {
            tracing::info!(%player, %address, "wallet linked");
            format!("Wallet linked: {address}. Your items will now sync to the bridge.")
        }
        Err(e) => {
            tracing::error!(%player, error = %e, "wallet link failed to persist");
            "Could not save your wallet link, try again later.".to_string()
        }
    }
}

/// `/checkinventory` - show the caller's on-chain inventory.
pub fn checkinventory(plugin: &EmberlinkPlugin, player: PlayerId) -> String {
    let Some(address) = plugin.wallets().lookup(player) else {
        return "No wallet linked. Use /linkwallet <address> first.".to_string();
    };

    match plugin.bridge().inventory_of(&address) {
        Ok(balances) if balances.is_empty() => "Bridge inventory: empty.".to_string(),
        Ok(balances) => {
            let list = balances
                .iter()
                .map(|b| format!("token {} x{}", b.token_id, b.amount))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Bridge inventory: {list}")
        }
        Err(e) => {
            tracing::warn!(%player, error = %e, "inventory query failed");
            "Could not fetch inventory from the bridge.".to_string()
        }
    }
}
