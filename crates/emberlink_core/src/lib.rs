//! # EMBERLINK Core Types
//!
//! Engine-agnostic identities and event types shared by every EMBERLINK crate.
//!
//! ## Design Principles
//!
//! 1. **No engine types** - the host engine hands us opaque identifiers,
//!    nothing else of it crosses this boundary
//! 2. **Validated construction** - a [`WalletAddress`] cannot exist in an
//!    invalid state; the parser is the only way in
//! 3. **Content-derived idempotency** - an [`EventId`] is a SipHash-2-4 128-bit
//!    digest of the physical event, so redelivery of the same event yields the
//!    same key

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod event;
pub mod identity;

pub use event::{Direction, EventId, RelayEvent, TokenId};
pub use identity::{AddressError, PlayerId, WalletAddress};
