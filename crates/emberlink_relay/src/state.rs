//! # Relay Terminal States
//!
//! The observable vocabulary of the relay. Every enqueued event ends in
//! exactly one [`RelayOutcome`], reported on the dispatcher's completions
//! channel. Background failures never surface to gameplay; they surface here.

use std::fmt;

use emberlink_core::{EventId, PlayerId};

/// Why an event was dropped without a bridge call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The player has no linked wallet.
    NoWallet,
    /// The item is not in the token map.
    UntrackedItem,
    /// The shard queue was full at enqueue time.
    Backpressure,
    /// The dispatcher was shutting down.
    Shutdown,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWallet => f.write_str("no wallet linked"),
            Self::UntrackedItem => f.write_str("item not tracked"),
            Self::Backpressure => f.write_str("queue full"),
            Self::Shutdown => f.write_str("shutting down"),
        }
    }
}

/// Terminal state of one relay event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The bridge accepted the operation and the event identifier is on the
    /// ledger. Resubmission of the same identifier is a no-op.
    Committed,
    /// The bridge refused the operation, or delivery failed permanently, or
    /// transient failures exhausted the attempt budget.
    Rejected(String),
    /// The event was discarded without a bridge call.
    Dropped(DropReason),
}

impl RelayOutcome {
    /// Whether the event's effect is on chain.
    #[inline]
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// One terminal transition, emitted on the completions channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayCompletion {
    /// Idempotency key of the event.
    pub event_id: EventId,
    /// Player the event belonged to.
    pub player: PlayerId,
    /// Terminal state reached.
    pub outcome: RelayOutcome,
}
