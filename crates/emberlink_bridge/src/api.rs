//! # Bridge API Seam
//!
//! The trait the relay depends on. Production wires in
//! [`HttpBridgeClient`](crate::client::HttpBridgeClient); tests wire in fakes.

use thiserror::Error;

use emberlink_core::{EventId, TokenId, WalletAddress};

use crate::wire::TokenBalance;

/// Terminal classification of one bridge mutation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The bridge accepted the operation.
    Accepted,
    /// The bridge understood the operation and refused it. Not retryable.
    RejectedByRemote(String),
    /// Delivery failed in a way that may heal (timeout, 5xx). Retryable.
    TransientFailure(String),
    /// Delivery failed in a way that will not heal (4xx). Not retryable.
    PermanentFailure(String),
}

impl BridgeOutcome {
    /// Whether a retry of the same call could succeed.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }

    /// Whether the operation was accepted.
    #[inline]
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Errors from bridge read queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The request never reached the bridge (connect failure, timeout).
    #[error("bridge transport failure: {0}")]
    Transport(String),

    /// The bridge answered with a non-success status.
    #[error("bridge returned http {0}")]
    Status(u16),

    /// The bridge answered 200 with a body we cannot decode.
    #[error("bridge response undecodable: {0}")]
    BadBody(String),
}

/// Operations the relay needs from the bridge service.
///
/// Mutations return a [`BridgeOutcome`] rather than a `Result`: every attempt
/// has a classification, and no classification is an error to the worker.
pub trait BridgeApi: Send + Sync {
    /// Mints `amount` of `token` to `address` for the physical event
    /// identified by `event_id`.
    fn mint(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome;

    /// Burns `amount` of `token` from `address` for the physical event
    /// identified by `event_id`.
    fn burn(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome;

    /// Returns the full on-chain inventory of `address`, materialized.
    fn inventory_of(&self, address: &WalletAddress) -> Result<Vec<TokenBalance>, BridgeError>;
}
