//! # Bridge Wire Types
//!
//! JSON bodies exchanged with the bridge service. Field names are the bridge
//! API's camelCase contract; `itemId` on the wire is the numeric chain token
//! identifier, not the engine item string.

use serde::{Deserialize, Serialize};

use emberlink_core::TokenId;

/// Body of `POST /bridge/mint` and `POST /bridge/burn`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    /// Destination (mint) or source (burn) wallet address.
    pub player_address: String,
    /// Chain token identifier.
    pub item_id: TokenId,
    /// Token amount.
    pub amount: u32,
    /// Idempotency key, 32 hex digits.
    pub event_id: String,
}

/// Body of a `200 OK` mutation response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Whether the bridge accepted the operation.
    pub success: bool,
    /// Refusal reason when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry of `GET /bridge/inventory/{address}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Chain token identifier.
    pub token_id: TokenId,
    /// Held amount.
    pub amount: u64,
}
