//! Keypairs and balances.
//!
//! An address the node has never seen is a legal state (nobody has sent it
//! anything yet), so [`AccountService::get_balance`] reports it as zero.
//! Callers that need to tell "unfunded" from "empty" use
//! [`AccountService::account_info`], which returns `None` for the former.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::amount::AtomicAmount;
use crate::config::NetworkType;
use crate::identity::address::Address;
use crate::identity::keypair::{InvalidSecret, Keypair};
use crate::network::context::NetworkContext;
use crate::network::gateway::{AccountInfo, GatewayError, NodeGateway};
use crate::transaction::types::MosaicId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(#[from] GatewayError),

    #[error("address {address} is on {address_network}, node is on {node_network}")]
    NetworkMismatch {
        address: Address,
        address_network: NetworkType,
        node_network: NetworkType,
    },

    #[error("holdings of {mosaic} for {address} overflow u64")]
    BalanceOverflow { address: Address, mosaic: MosaicId },
}

/// Keypair generation and account queries against one gateway.
#[derive(Clone)]
pub struct AccountService {
    gateway: Arc<dyn NodeGateway>,
    network: NetworkType,
}

impl AccountService {
    /// `network` is what [`Self::generate_keypair`] creates accounts on.
    pub fn new(gateway: Arc<dyn NodeGateway>, network: NetworkType) -> Self {
        Self { gateway, network }
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Fresh keypair from the OS RNG, on the configured network.
    pub fn generate_keypair(&self) -> Keypair {
        let keypair = Keypair::generate(self.network);
        debug!(address = %keypair.address(), "generated keypair");
        keypair
    }

    /// Rebuilds the keypair for a 64-hex-character secret on `network`.
    pub fn derive_keypair(&self, secret: &str, network: NetworkType) -> Result<Keypair, InvalidSecret> {
        Keypair::from_private_key_hex(secret, network)
    }

    /// Raw account state. `None` if the node does not know the address.
    pub async fn account_info(&self, address: &Address) -> Result<Option<AccountInfo>, AccountError> {
        Ok(self.gateway.account_info(address).await?)
    }

    /// Native currency balance of `address`, in atomic units.
    ///
    /// Sums every holding whose id is the context's currency id. Unknown
    /// addresses are 0.
    pub async fn get_balance(
        &self,
        address: &Address,
        context: &NetworkContext,
    ) -> Result<AtomicAmount, AccountError> {
        if address.network() != context.network {
            return Err(AccountError::NetworkMismatch {
                address: *address,
                address_network: address.network(),
                node_network: context.network,
            });
        }

        let Some(info) = self.account_info(address).await? else {
            debug!(%address, "account unknown to node, balance 0");
            return Ok(0);
        };

        let balance = info
            .balance_of(context.currency_id)
            .ok_or(AccountError::BalanceOverflow {
                address: *address,
                mosaic: context.currency_id,
            })?;
        debug!(%address, balance, "balance fetched");
        Ok(balance)
    }
}
