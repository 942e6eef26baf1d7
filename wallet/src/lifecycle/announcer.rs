//! Fire-and-forget announcement.
//!
//! Acceptance by the node only means the payload will be propagated. Whether
//! it ever confirms is [`super::confirmation`]'s business.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::identity::address::Address;
use crate::network::gateway::{GatewayError, NodeGateway};
use crate::transaction::signing::SignedTransaction;
use crate::transaction::types::TransactionHash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnounceError {
    /// The node refused the payload (malformed, duplicate, unfunded...).
    /// `body` is exactly what the node sent.
    #[error("rejected by node (HTTP {status}): {body}")]
    RejectedByNode { status: u16, body: String },

    #[error("network unavailable: {0}")]
    NetworkUnavailable(GatewayError),
}

impl From<GatewayError> for AnnounceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Http { status, body } if (400..500).contains(&status) => {
                Self::RejectedByNode { status, body }
            }
            other => Self::NetworkUnavailable(other),
        }
    }
}

/// Proof that a node accepted a payload for propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementReceipt {
    pub hash: TransactionHash,
    pub signer: Address,
    /// Whatever the node said on acceptance.
    pub message: String,
    pub announced_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Announcer {
    gateway: Arc<dyn NodeGateway>,
}

impl Announcer {
    pub fn new(gateway: Arc<dyn NodeGateway>) -> Self {
        Self { gateway }
    }

    /// Submits `signed` once. Never retries.
    pub async fn announce(&self, signed: &SignedTransaction) -> Result<AnnouncementReceipt, AnnounceError> {
        let hash = signed.hash();
        match self.gateway.announce(signed).await {
            Ok(response) => {
                info!(%hash, signer = %signed.signer_address(), "transaction announced");
                Ok(AnnouncementReceipt {
                    hash,
                    signer: *signed.signer_address(),
                    message: response.message,
                    announced_at: Utc::now(),
                })
            }
            Err(err) => {
                warn!(%hash, error = %err, "announcement failed");
                Err(err.into())
            }
        }
    }
}
