//! # EMBERLINK Event Relay
//!
//! Turns engine inventory events into exactly-one-effect bridge calls.
//!
//! ## Architecture
//!
//! ```text
//! Engine threads                 Dispatch workers              External
//! ──────────────                 ────────────────              ────────
//!  on_item_pickup ──┐
//!  on_item_consume ─┤ enqueue    ┌─────────────┐   mint/burn  ┌────────┐
//!        │          ├──────────▶ │ shard 0 FIFO│ ───────────▶ │ Bridge │
//!     (returns      │  (bounded, │ shard 1 FIFO│    (retry    │Service │
//!   immediately)    │  lossy)    │     ...     │   backoff)   └────────┘
//!                   └─────────── └──────┬──────┘
//!                                       │ terminal states
//!                                       ▼
//!                               completions channel
//! ```
//!
//! ## State Machine (per event)
//!
//! ```text
//! Pending ──▶ Resolving ──▶ Dispatching ──▶ Committed
//!                │               │
//!                ▼               ▼
//!             Dropped         Rejected
//! ```
//!
//! Events for the same player always land on the same shard, so mint/burn
//! pairs for one player can never reorder, even across retries. Different
//! players dispatch concurrently.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod dispatcher;
pub mod state;
pub mod token_map;

pub use dispatcher::{RelayConfig, RelayDispatcher, RelayStats};
pub use state::{DropReason, RelayCompletion, RelayOutcome};
pub use token_map::{ItemTokenMap, TokenMapError};
