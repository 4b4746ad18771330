//! End-to-end verification of the assembled plugin.
//!
//! Drives the plugin exactly as an engine adapter would - inventory
//! callbacks and chat commands - against a scripted bridge double, and
//! verifies the delivery contract: exactly one bridge effect per physical
//! event, drops for unresolved lookups, and durability across a restart.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use emberlink::{checkinventory, linkwallet, EmberlinkConfig, EmberlinkPlugin, InventorySink};
use emberlink_bridge::{BridgeApi, BridgeError, BridgeOutcome, TokenBalance};
use emberlink_core::{EventId, PlayerId, TokenId, WalletAddress};
use emberlink_relay::{DropReason, RelayCompletion, RelayOutcome};

/// A recorded bridge mutation.
type Call = (&'static str, String, TokenId, u32, EventId);

/// Scripted bridge double.
struct FakeBridge {
    calls: Mutex<Vec<Call>>,
    inventory: Vec<TokenBalance>,
}

impl FakeBridge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            inventory: Vec::new(),
        })
    }

    fn with_inventory(inventory: Vec<TokenBalance>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            inventory,
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl BridgeApi for FakeBridge {
    fn mint(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome {
        self.calls
            .lock()
            .push(("mint", address.as_str().to_string(), token, amount, event_id));
        BridgeOutcome::Accepted
    }

    fn burn(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome {
        self.calls
            .lock()
            .push(("burn", address.as_str().to_string(), token, amount, event_id));
        BridgeOutcome::Accepted
    }

    fn inventory_of(&self, _address: &WalletAddress) -> Result<Vec<TokenBalance>, BridgeError> {
        Ok(self.inventory.clone())
    }
}

/// Temp data directory, removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        Self(std::env::temp_dir().join(format!("emberlink_it_{tag}_{id}")))
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn test_config(data_dir: &TempDir) -> EmberlinkConfig {
    let mut config = EmberlinkConfig::from_toml_str(
        r#"
        [relay]
        workers = 1
        queue_bound = 16
        max_attempts = 3
        backoff_base_ms = 1
        backoff_cap_ms = 4
        shutdown_grace_ms = 1000

        [[tokens]]
        item = "ore_copper"
        token = 7

        [[tokens]]
        item = "hytale:cheese"
        token = 1
        "#,
    )
    .unwrap();
    config.storage.data_dir = data_dir.0.clone();
    config
}

const ADDRESS: &str = "0xABC0000000000000000000000000000000000abc";

fn await_completion(rx: &Receiver<RelayCompletion>) -> RelayCompletion {
    rx.recv_timeout(Duration::from_secs(2)).unwrap()
}

#[test]
fn pickup_mints_exactly_once_and_redelivery_is_absorbed() {
    let dir = TempDir::new("mint_once");
    let bridge = FakeBridge::new();
    let plugin =
        EmberlinkPlugin::with_bridge(&test_config(&dir), Arc::clone(&bridge) as Arc<dyn BridgeApi>,)
            .unwrap();
    let completions = plugin.dispatcher().completions();

    let player = PlayerId::new(0xa11ce);
    assert!(linkwallet(&plugin, player, ADDRESS).starts_with("Wallet linked"));

    // Physical event: pickup of 3 ore_copper, engine sequence 42
    plugin.on_item_pickup(player, "ore_copper", 3, 42);
    assert_eq!(await_completion(&completions).outcome, RelayOutcome::Committed);

    // Engine redelivers the same physical event
    plugin.on_item_pickup(player, "ore_copper", 3, 42);
    assert_eq!(await_completion(&completions).outcome, RelayOutcome::Committed);

    let calls = bridge.calls();
    assert_eq!(calls.len(), 1, "one bridge call per distinct event id");
    let (op, address, token, amount, _) = &calls[0];
    assert_eq!(*op, "mint");
    assert_eq!(address, &ADDRESS.to_lowercase());
    assert_eq!(*token, 7);
    assert_eq!(*amount, 3);

    plugin.shutdown();
}

#[test]
fn consume_burns_and_orders_after_pickup() {
    let dir = TempDir::new("burn_order");
    let bridge = FakeBridge::new();
    let plugin =
        EmberlinkPlugin::with_bridge(&test_config(&dir), Arc::clone(&bridge) as Arc<dyn BridgeApi>,)
            .unwrap();
    let completions = plugin.dispatcher().completions();

    let player = PlayerId::new(0xb0b);
    linkwallet(&plugin, player, ADDRESS);

    plugin.on_item_pickup(player, "hytale:cheese", 2, 1);
    plugin.on_item_consume(player, "hytale:cheese", 2, 2);
    await_completion(&completions);
    await_completion(&completions);

    let calls = bridge.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "mint");
    assert_eq!(calls[1].0, "burn");

    plugin.shutdown();
}

#[test]
fn untracked_item_and_unlinked_player_never_reach_the_bridge() {
    let dir = TempDir::new("drops");
    let bridge = FakeBridge::new();
    let plugin =
        EmberlinkPlugin::with_bridge(&test_config(&dir), Arc::clone(&bridge) as Arc<dyn BridgeApi>,)
            .unwrap();
    let completions = plugin.dispatcher().completions();

    let linked = PlayerId::new(1);
    let unlinked = PlayerId::new(2);
    linkwallet(&plugin, linked, ADDRESS);

    plugin.on_item_pickup(linked, "hytale:void_scythe", 1, 1);
    assert_eq!(
        await_completion(&completions).outcome,
        RelayOutcome::Dropped(DropReason::UntrackedItem)
    );

    plugin.on_item_pickup(unlinked, "ore_copper", 1, 2);
    assert_eq!(
        await_completion(&completions).outcome,
        RelayOutcome::Dropped(DropReason::NoWallet)
    );

    assert!(bridge.calls().is_empty());
    plugin.shutdown();
}

#[test]
fn zero_amount_events_are_ignored() {
    let dir = TempDir::new("zero");
    let bridge = FakeBridge::new();
    let plugin =
        EmberlinkPlugin::with_bridge(&test_config(&dir), Arc::clone(&bridge) as Arc<dyn BridgeApi>,)
            .unwrap();

    let player = PlayerId::new(3);
    linkwallet(&plugin, player, ADDRESS);
    plugin.on_item_pickup(player, "ore_copper", 0, 1);

    assert_eq!(
        plugin
            .dispatcher()
            .stats()
            .enqueued
            .load(std::sync::atomic::Ordering::Relaxed),
        0
    );
    plugin.shutdown();
}

#[test]
fn invalid_address_leaves_prior_link_untouched() {
    let dir = TempDir::new("badaddr");
    let plugin = EmberlinkPlugin::with_bridge(&test_config(&dir), FakeBridge::new() as _).unwrap();

    let player = PlayerId::new(4);
    linkwallet(&plugin, player, ADDRESS);

    let reply = linkwallet(&plugin, player, "notanaddress");
    assert!(reply.starts_with("Invalid wallet address"));

    let kept = plugin.wallets().lookup(player).unwrap();
    assert_eq!(kept.as_str(), ADDRESS.to_lowercase());
    plugin.shutdown();
}

#[test]
fn checkinventory_formats_balances_and_handles_no_wallet() {
    let dir = TempDir::new("checkinv");
    let bridge = FakeBridge::with_inventory(vec![
        TokenBalance {
            token_id: 7,
            amount: 12,
        },
        TokenBalance {
            token_id: 1,
            amount: 2,
        },
    ]);
    let plugin =
        EmberlinkPlugin::with_bridge(&test_config(&dir), Arc::clone(&bridge) as Arc<dyn BridgeApi>,)
            .unwrap();

    let player = PlayerId::new(5);
    assert_eq!(
        checkinventory(&plugin, player),
        "No wallet linked. Use /linkwallet <address> first."
    );

    linkwallet(&plugin, player, ADDRESS);
    assert_eq!(
        checkinventory(&plugin, player),
        "Bridge inventory: token 7 x12, token 1 x2"
    );
    plugin.shutdown();
}

#[test]
fn links_and_ledger_survive_restart() {
    let dir = TempDir::new("restart");
    let player = PlayerId::new(6);
    let event_sequence = 9;

    {
        let bridge = FakeBridge::new();
        let plugin = EmberlinkPlugin::with_bridge(
            &test_config(&dir),
            Arc::clone(&bridge) as Arc<dyn BridgeApi>,
        )
        .unwrap();
        let completions = plugin.dispatcher().completions();

        linkwallet(&plugin, player, ADDRESS);
        plugin.on_item_pickup(player, "ore_copper", 3, event_sequence);
        assert_eq!(await_completion(&completions).outcome, RelayOutcome::Committed);
        assert_eq!(bridge.calls().len(), 1);

        plugin.shutdown();
    }

    // Restart: fresh plugin, fresh bridge, same data directory
    {
        let bridge = FakeBridge::new();
        let plugin = EmberlinkPlugin::with_bridge(
            &test_config(&dir),
            Arc::clone(&bridge) as Arc<dyn BridgeApi>,
        )
        .unwrap();
        let completions = plugin.dispatcher().completions();

        // The wallet link survived
        assert!(plugin.wallets().lookup(player).is_some());

        // Redelivery of the committed event after restart: absorbed
        plugin.on_item_pickup(player, "ore_copper", 3, event_sequence);
        assert_eq!(await_completion(&completions).outcome, RelayOutcome::Committed);
        assert!(bridge.calls().is_empty(), "no second mint after restart");

        plugin.shutdown();
    }
}
