//! The node gateway contract.
//!
//! Everything the wallet needs from a node goes through [`NodeGateway`]:
//! network parameters, account state, announcement, the confirmed-lookup and
//! the push channel. [`super::http::HttpGateway`] talks to a real node;
//! `MockGateway` (feature `test-util`) is an in-memory stand-in for tests.
//!
//! Gateways report transport and protocol failures as [`GatewayError`] and
//! leave policy (retry, fallback, zero balance) to the callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FeeStrategy;
use crate::identity::address::Address;
use crate::transaction::signing::SignedTransaction;
use crate::transaction::types::{GenerationHash, Mosaic, MosaicId, TransactionHash};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures talking to a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The node could not be reached, or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a non-success status. `body` is verbatim.
    #[error("node returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The node answered with something we could not decode.
    #[error("unexpected response from node: {0}")]
    Decode(String),

    /// The push channel ended.
    #[error("push channel closed")]
    ChannelClosed,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Fee multiplier statistics over recent blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeMultipliers {
    #[serde(rename = "averageFeeMultiplier")]
    pub average: u32,
    #[serde(rename = "medianFeeMultiplier")]
    pub median: u32,
    #[serde(rename = "highestFeeMultiplier")]
    pub highest: u32,
    #[serde(rename = "lowestFeeMultiplier")]
    pub lowest: u32,
    #[serde(rename = "minFeeMultiplier")]
    pub minimum: u32,
}

impl FeeMultipliers {
    pub fn select(&self, strategy: FeeStrategy) -> u32 {
        match strategy {
            FeeStrategy::Average => self.average,
            FeeStrategy::Median => self.median,
            FeeStrategy::Highest => self.highest,
            FeeStrategy::Lowest => self.lowest,
            FeeStrategy::Minimum => self.minimum,
        }
    }
}

/// Account state as far as the wallet cares: who, and what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub mosaics: Vec<Mosaic>,
}

impl AccountInfo {
    /// Checked sum of every holding of `id`. `None` on overflow.
    pub fn balance_of(&self, id: MosaicId) -> Option<u64> {
        self.mosaics
            .iter()
            .filter(|m| m.id == id)
            .try_fold(0u64, |acc, m| acc.checked_add(m.amount))
    }
}

/// A transaction the node reports as confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
    pub hash: TransactionHash,
    pub height: u64,
}

/// What the node said when it accepted a payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnounceResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Push channel
// ---------------------------------------------------------------------------

/// One event on an address-scoped push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A new block. Carries no information about any transaction; only
    /// proves the channel is alive.
    Block { height: u64 },
    /// A transaction involving the address was confirmed.
    Confirmed { hash: TransactionHash, height: u64 },
    /// The node reported a transaction involving the address as failed.
    Status { hash: TransactionHash, code: String },
}

/// A live push-channel subscription.
///
/// `close` is synchronous and idempotent, so it can run from `Drop`.
#[async_trait]
pub trait Subscription: Send {
    /// Next event. [`GatewayError::ChannelClosed`] once the stream ends.
    async fn next_event(&mut self) -> Result<ChannelEvent, GatewayError>;

    /// Tears the subscription down. Safe to call more than once.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// NodeGateway
// ---------------------------------------------------------------------------

/// A node's data-access interface.
#[async_trait]
pub trait NodeGateway: Send + Sync {
    /// Raw network identifier byte.
    async fn network_identifier(&self) -> Result<u8, GatewayError>;

    /// Network epoch as Unix seconds.
    async fn epoch_adjustment(&self) -> Result<u64, GatewayError>;

    async fn generation_hash(&self) -> Result<GenerationHash, GatewayError>;

    /// Native currency mosaic id, `None` if the node does not report one.
    async fn currency_id(&self) -> Result<Option<MosaicId>, GatewayError>;

    async fn fee_multipliers(&self) -> Result<FeeMultipliers, GatewayError>;

    /// `None` if the node has never seen the address.
    async fn account_info(&self, address: &Address) -> Result<Option<AccountInfo>, GatewayError>;

    /// Submits a signed payload. Returns once the node accepted it for
    /// propagation; that is not confirmation.
    async fn announce(&self, signed: &SignedTransaction) -> Result<AnnounceResponse, GatewayError>;

    /// `None` if the transaction is not (yet) confirmed.
    async fn confirmed_transaction(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ConfirmedTransaction>, GatewayError>;

    /// Opens a push channel for events involving `address`.
    async fn subscribe(&self, address: &Address) -> Result<Box<dyn Subscription>, GatewayError>;
}
