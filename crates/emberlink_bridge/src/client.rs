//! # HTTP Bridge Client
//!
//! Blocking `reqwest` client for the bridge REST API. One instance is shared
//! by every dispatcher worker; `reqwest::blocking::Client` pools connections
//! internally.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use emberlink_core::{EventId, TokenId, WalletAddress};

use crate::api::{BridgeApi, BridgeError, BridgeOutcome};
use crate::wire::{BridgeRequest, BridgeResponse, TokenBalance};

/// Configuration for the HTTP bridge client.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Base URL of the bridge service, without trailing slash.
    pub base_url: String,
    /// Per-request timeout (connect + response).
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Counters for bridge traffic.
#[derive(Debug, Default)]
pub struct BridgeStats {
    /// Mutations sent (attempts, not events).
    pub requests_sent: AtomicU64,
    /// Mutations accepted.
    pub accepted: AtomicU64,
    /// Mutations refused by the remote.
    pub rejected_by_remote: AtomicU64,
    /// Transient delivery failures.
    pub transient_failures: AtomicU64,
    /// Permanent delivery failures.
    pub permanent_failures: AtomicU64,
}

/// Production [`BridgeApi`] implementation over HTTP.
pub struct HttpBridgeClient {
    /// Base URL, normalized without trailing slash.
    base_url: String,
    /// Shared blocking client (connection pool).
    http: reqwest::blocking::Client,
    /// Traffic counters.
    stats: BridgeStats,
}

impl HttpBridgeClient {
    /// Builds a client from configuration.
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            stats: BridgeStats::default(),
        })
    }

    /// Returns the traffic counters.
    #[must_use]
    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Sends one mutation and classifies the outcome.
    fn mutate(
        &self,
        op: &str,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome {
        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);

        let request = BridgeRequest {
            player_address: address.as_str().to_string(),
            item_id: token,
            amount,
            event_id: event_id.to_string(),
        };

        let url = format!("{}/bridge/{op}", self.base_url);
        let outcome = match self.http.post(&url).json(&request).send() {
            Err(e) => BridgeOutcome::TransientFailure(e.to_string()),
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() {
                    BridgeOutcome::TransientFailure(format!("http {status}"))
                } else if status.is_success() {
                    // Body may be truncated in transit; retrying is safe
                    // because the remote deduplicates by eventId
                    match response.json::<BridgeResponse>() {
                        Ok(body) => classify_ok_body(body),
                        Err(e) => BridgeOutcome::TransientFailure(format!("bad body: {e}")),
                    }
                } else {
                    BridgeOutcome::PermanentFailure(format!("http {status}"))
                }
            }
        };

        self.note(op, token, event_id, &outcome);
        outcome
    }

    /// Records the outcome in the counters and the log.
    fn note(&self, op: &str, token: TokenId, event_id: EventId, outcome: &BridgeOutcome) {
        match outcome {
            BridgeOutcome::Accepted => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%event_id, op, token, "bridge accepted");
            }
            BridgeOutcome::RejectedByRemote(reason) => {
                self.stats.rejected_by_remote.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%event_id, op, token, reason, "bridge rejected");
            }
            BridgeOutcome::TransientFailure(reason) => {
                self.stats.transient_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%event_id, op, token, reason, "bridge transient failure");
            }
            BridgeOutcome::PermanentFailure(reason) => {
                self.stats.permanent_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%event_id, op, token, reason, "bridge permanent failure");
            }
        }
    }
}

/// Classifies the body of a `200 OK` mutation response.
fn classify_ok_body(body: BridgeResponse) -> BridgeOutcome {
    if body.success {
        BridgeOutcome::Accepted
    } else {
        BridgeOutcome::RejectedByRemote(
            body.error.unwrap_or_else(|| "unspecified".to_string()),
        )
    }
}

impl BridgeApi for HttpBridgeClient {
    fn mint(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome {
        self.mutate("mint", address, token, amount, event_id)
    }

    fn burn(
        &self,
        address: &WalletAddress,
        token: TokenId,
        amount: u32,
        event_id: EventId,
    ) -> BridgeOutcome {
        self.mutate("burn", address, token, amount, event_id)
    }

    fn inventory_of(&self, address: &WalletAddress) -> Result<Vec<TokenBalance>, BridgeError> {
        let url = format!("{}/bridge/inventory/{}", self.base_url, address);

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status.as_u16()));
        }

        response
            .json::<Vec<TokenBalance>>()
            .map_err(|e| BridgeError::BadBody(e.to_string()))
    }
}
