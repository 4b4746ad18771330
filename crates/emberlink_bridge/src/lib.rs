//! # EMBERLINK Bridge Client
//!
//! Outbound HTTP client for the external token bridge service.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐   POST /bridge/mint    ┌──────────────┐
//! │  Dispatcher  │ ─────────────────────▶ │   Bridge     │
//! │  Worker      │   {.., eventId}        │   Service    │
//! │              │ ◀───────────────────── │  (dedup by   │
//! └──────────────┘   {success, error?}    │   eventId)   │
//!                                         └──────────────┘
//! ```
//!
//! Calls are **at-least-once**: every mutation carries its `eventId`, the
//! remote deduplicates, and the caller may safely retry any outcome classified
//! as transient. The classification contract:
//!
//! | Observation                   | Outcome            |
//! |-------------------------------|--------------------|
//! | Transport error / timeout     | `TransientFailure` |
//! | HTTP 5xx                      | `TransientFailure` |
//! | HTTP 200, `success: true`     | `Accepted`         |
//! | HTTP 200, `success: false`    | `RejectedByRemote` |
//! | Any other status (4xx, 3xx)   | `PermanentFailure` |

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod api;
pub mod client;
pub mod wire;

pub use api::{BridgeApi, BridgeError, BridgeOutcome};
pub use client::{BridgeConfig, BridgeStats, HttpBridgeClient};
pub use wire::{BridgeRequest, BridgeResponse, TokenBalance};
