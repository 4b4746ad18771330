//! # Relay Dispatcher
//!
//! Sharded worker pool between the engine's event threads and the bridge.
//!
//! Each worker owns one bounded queue. Events route to
//! `player % worker_count`, so one player's events are FIFO through a single
//! worker while different players dispatch in parallel. `enqueue` never
//! blocks: a full shard drops the event with a warning instead of stalling
//! the engine or growing without bound.
//!
//! Every event reaches exactly one terminal state, and every terminal state
//! is emitted on the completions channel. No error escapes a worker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use emberlink_bridge::{BridgeApi, BridgeOutcome};
use emberlink_core::{Direction, RelayEvent};
use emberlink_store::{EventLedger, WalletStore};

use crate::state::{DropReason, RelayCompletion, RelayOutcome};
use crate::token_map::ItemTokenMap;

/// How often an idle worker re-checks the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Granularity of cancellable backoff sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Configuration for the relay dispatcher.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Number of dispatch workers (shards). Minimum 1.
    pub workers: usize,
    /// Bounded queue depth per shard; a full shard drops new events.
    pub queue_bound: usize,
    /// Total delivery attempts per event (first try + retries).
    pub max_attempts: u32,
    /// First retry backoff; doubles per retry.
    pub backoff_base: Duration,
    /// Upper bound on a single backoff sleep.
    pub backoff_cap: Duration,
    /// How long shutdown lets in-flight retries keep going.
    pub shutdown_grace: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_bound: 256,
            max_attempts: 3,
            backoff_base: Duration::from_millis(50),
            backoff_cap: Duration::from_secs(2),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Counters for relay traffic.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Events accepted into a shard queue.
    pub enqueued: AtomicU64,
    /// Events that reached `Committed`.
    pub committed: AtomicU64,
    /// Events that reached `Rejected`.
    pub rejected: AtomicU64,
    /// Resubmissions short-circuited by the ledger.
    pub duplicate_short_circuits: AtomicU64,
    /// Retry attempts performed (not first tries).
    pub retries: AtomicU64,
    /// Events dropped: no wallet linked.
    pub dropped_no_wallet: AtomicU64,
    /// Events dropped: item not in the token map.
    pub dropped_untracked: AtomicU64,
    /// Events dropped at enqueue: shard queue full.
    pub dropped_backpressure: AtomicU64,
    /// Events dropped because the dispatcher was shutting down.
    pub dropped_shutdown: AtomicU64,
}

/// Shared state each worker needs.
struct WorkerCtx {
    wallets: Arc<WalletStore>,
    ledger: Arc<EventLedger>,
    tokens: Arc<ItemTokenMap>,
    bridge: Arc<dyn BridgeApi>,
    completions: Sender<RelayCompletion>,
    stats: Arc<RelayStats>,
    running: Arc<AtomicBool>,
    deadline: Arc<Mutex<Option<Instant>>>,
    config: RelayConfig,
}

impl WorkerCtx {
    /// Worker main loop: pull, process, drain on shutdown.
    fn run(&self, shard: usize, rx: &Receiver<RelayEvent>) {
        tracing::debug!(shard, "dispatch worker started");
        loop {
            if !self.running.load(Ordering::Acquire) {
                // Still-queued events are Pending; they must not half-execute
                // during shutdown, so they terminate as Dropped
                while let Ok(event) = rx.try_recv() {
                    self.stats.dropped_shutdown.fetch_add(1, Ordering::Relaxed);
                    self.complete(&event, RelayOutcome::Dropped(DropReason::Shutdown));
                }
                break;
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => self.process(&event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!(shard, "dispatch worker stopped");
    }

    /// Drives one event from Resolving to a terminal state.
    fn process(&self, event: &RelayEvent) {
        // Resolving: ledger short-circuit first, so a redelivered event never
        // reaches the bridge twice
        if self.ledger.contains(event.event_id) {
            self.stats
                .duplicate_short_circuits
                .fetch_add(1, Ordering::Relaxed);
            tracing::debug!(event_id = %event.event_id, "duplicate event short-circuited");
            self.complete(event, RelayOutcome::Committed);
            return;
        }

        let Some(address) = self.wallets.lookup(event.player) else {
            self.stats.dropped_no_wallet.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(player = %event.player, "event dropped: no wallet linked");
            self.complete(event, RelayOutcome::Dropped(DropReason::NoWallet));
            return;
        };

        let Some(token) = self.tokens.token_for(&event.item_id) else {
            self.stats.dropped_untracked.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(item = %event.item_id, "event dropped: item not tracked");
            self.complete(event, RelayOutcome::Dropped(DropReason::UntrackedItem));
            return;
        };

        // Dispatching
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = match event.direction {
                Direction::Mint => self.bridge.mint(&address, token, event.amount, event.event_id),
                Direction::Burn => self.bridge.burn(&address, token, event.amount, event.event_id),
            };

            match outcome {
                BridgeOutcome::Accepted => {
                    if let Err(e) = self.ledger.record(event.event_id) {
                        // The remote already deduplicates by eventId, so a
                        // redelivery after crash is absorbed there
                        tracing::error!(
                            event_id = %event.event_id,
                            error = %e,
                            "ledger write failed after accepted bridge call"
                        );
                    }
                    self.stats.committed.fetch_add(1, Ordering::Relaxed);
                    self.complete(event, RelayOutcome::Committed);
                    return;
                }
                BridgeOutcome::RejectedByRemote(reason)
                | BridgeOutcome::PermanentFailure(reason) => {
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        event_id = %event.event_id,
                        reason = %reason,
                        "event rejected, not retryable"
                    );
                    self.complete(event, RelayOutcome::Rejected(reason));
                    return;
                }
                BridgeOutcome::TransientFailure(reason) => {
                    if attempt >= self.config.max_attempts {
                        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            event_id = %event.event_id,
                            attempts = attempt,
                            reason = %reason,
                            "retry budget exhausted"
                        );
                        self.complete(event, RelayOutcome::Rejected(reason));
                        return;
                    }

                    let delay =
                        backoff_delay(self.config.backoff_base, self.config.backoff_cap, attempt);
                    self.stats.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        event_id = %event.event_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off"
                    );

                    if !self.sleep_cancellable(delay) {
                        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                        self.complete(
                            event,
                            RelayOutcome::Rejected(format!("shutdown during retry: {reason}")),
                        );
                        return;
                    }
                }
            }
        }
    }

    /// Sleeps `total`, waking early only if the shutdown grace deadline
    /// passes. Returns `false` when the deadline cut the sleep short.
    fn sleep_cancellable(&self, total: Duration) -> bool {
        let wake = Instant::now() + total;
        loop {
            if !self.running.load(Ordering::Acquire) {
                let deadline = *self.deadline.lock();
                if deadline.map_or(true, |d| Instant::now() >= d) {
                    return false;
                }
            }
            let now = Instant::now();
            if now >= wake {
                return true;
            }
            thread::sleep((wake - now).min(SLEEP_SLICE));
        }
    }

    /// Emits a terminal transition. Observability never blocks dispatch: if
    /// nobody is draining completions, the notification is lost, not the
    /// event.
    fn complete(&self, event: &RelayEvent, outcome: RelayOutcome) {
        let _ = self.completions.try_send(RelayCompletion {
            event_id: event.event_id,
            player: event.player,
            outcome,
        });
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped.
fn backoff_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let exponent = (attempt.saturating_sub(1)).min(16);
    base.saturating_mul(1u32 << exponent).min(cap)
}

/// The relay dispatcher: owns the shard queues and the worker threads.
pub struct RelayDispatcher {
    /// One sender per shard, indexed by `player % workers`.
    shards: Vec<Sender<RelayEvent>>,
    /// Sender side of the completions channel (enqueue-side drops).
    completions_tx: Sender<RelayCompletion>,
    /// Receiver side of the completions channel, cloneable.
    completions_rx: Receiver<RelayCompletion>,
    /// Intake flag; false once shutdown begins.
    running: Arc<AtomicBool>,
    /// Shutdown grace deadline, set when shutdown begins.
    deadline: Arc<Mutex<Option<Instant>>>,
    /// Traffic counters.
    stats: Arc<RelayStats>,
    /// Worker join handles, taken by shutdown.
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Configuration (shutdown grace).
    config: RelayConfig,
}

impl RelayDispatcher {
    /// Builds the dispatcher and spawns its workers.
    #[must_use]
    pub fn new(
        config: RelayConfig,
        wallets: Arc<WalletStore>,
        ledger: Arc<EventLedger>,
        tokens: Arc<ItemTokenMap>,
        bridge: Arc<dyn BridgeApi>,
    ) -> Self {
        let workers = config.workers.max(1);
        let completion_capacity = (config.queue_bound * workers * 4).max(64);
        let (completions_tx, completions_rx) = bounded(completion_capacity);

        let running = Arc::new(AtomicBool::new(true));
        let deadline = Arc::new(Mutex::new(None));
        let stats = Arc::new(RelayStats::default());

        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for shard in 0..workers {
            let (tx, rx) = bounded(config.queue_bound);
            let ctx = Arc::new(WorkerCtx {
                wallets: Arc::clone(&wallets),
                ledger: Arc::clone(&ledger),
                tokens: Arc::clone(&tokens),
                bridge: Arc::clone(&bridge),
                completions: completions_tx.clone(),
                stats: Arc::clone(&stats),
                running: Arc::clone(&running),
                deadline: Arc::clone(&deadline),
                config: config.clone(),
            });

            let handle = thread::Builder::new()
                .name(format!("emberlink-dispatch-{shard}"))
                .spawn(move || ctx.run(shard, &rx))
                .expect("spawn dispatch worker");

            shards.push(tx);
            handles.push(handle);
        }

        Self {
            shards,
            completions_tx,
            completions_rx,
            running,
            deadline,
            stats,
            handles: Mutex::new(handles),
            config,
        }
    }

    /// Enqueues one event for dispatch. Never blocks.
    ///
    /// Returns `false` when the event was dropped immediately (full shard
    /// queue or shutdown); the drop is also logged and emitted as a
    /// completion.
    pub fn enqueue(&self, event: RelayEvent) -> bool {
        if !self.running.load(Ordering::Acquire) {
            self.drop_at_enqueue(&event, DropReason::Shutdown);
            return false;
        }

        let shard = (event.player.raw() % self.shards.len() as u128) as usize;
        match self.shards[shard].try_send(event) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(event)) => {
                self.drop_at_enqueue(&event, DropReason::Backpressure);
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                self.drop_at_enqueue(&event, DropReason::Shutdown);
                false
            }
        }
    }

    /// Records and reports an enqueue-side drop.
    fn drop_at_enqueue(&self, event: &RelayEvent, reason: DropReason) {
        let counter = match reason {
            DropReason::Backpressure => &self.stats.dropped_backpressure,
            _ => &self.stats.dropped_shutdown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(event_id = %event.event_id, %reason, "event dropped at enqueue");
        let _ = self.completions_tx.try_send(RelayCompletion {
            event_id: event.event_id,
            player: event.player,
            outcome: RelayOutcome::Dropped(reason),
        });
    }

    /// Returns a clone of the completions receiver.
    ///
    /// Every terminal transition is emitted here; tests and monitoring drain
    /// it. Undrained completions are dropped once the channel fills.
    #[must_use]
    pub fn completions(&self) -> Receiver<RelayCompletion> {
        self.completions_rx.clone()
    }

    /// Returns the traffic counters.
    #[must_use]
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Whether the dispatcher is accepting events.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops intake, lets in-flight work finish within the grace budget,
    /// drains still-queued events as Dropped, and joins the workers.
    ///
    /// Idempotent; the second call returns immediately.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        *self.deadline.lock() = Some(Instant::now() + self.config.shutdown_grace);
        tracing::info!(
            grace_ms = self.config.shutdown_grace.as_millis() as u64,
            "relay dispatcher shutting down"
        );

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}
