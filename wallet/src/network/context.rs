//! Network parameters and their cache.
//!
//! A [`NetworkContext`] is everything a transfer needs to know about the
//! network it targets. It is fetched in one gated sequence from a single
//! gateway, so its fields never mix two nodes' views.
//!
//! [`NetworkContextCache`] holds one context for a configurable time. It is
//! owned by whoever owns the gateway (normally the
//! [`crate::client::WalletClient`]); there is no process-wide cache.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::gateway::{GatewayError, NodeGateway};
use crate::config::{network_name, FeeStrategy, NetworkType};
use crate::transaction::types::{GenerationHash, MosaicId};

/// Reasons a context could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(#[from] GatewayError),

    #[error("node reports no native currency mosaic")]
    MissingCurrency,

    #[error("node reports unknown network identifier 0x{0:02X}")]
    UnknownNetwork(u8),
}

/// Immutable snapshot of the parameters a transfer is built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkContext {
    pub network: NetworkType,
    /// Network epoch, Unix seconds.
    pub epoch_adjustment: u64,
    pub generation_hash: GenerationHash,
    pub currency_id: MosaicId,
    /// Fee multiplier picked by the configured [`FeeStrategy`].
    pub fee_multiplier: u32,
}

/// Fetches a fresh context from `gateway`.
///
/// Steps run in order and the first failure aborts: network identifier,
/// epoch adjustment, generation hash, currency id, fee multipliers. No
/// partial context is ever returned.
pub async fn fetch_network_context(
    gateway: &dyn NodeGateway,
    fee_strategy: FeeStrategy,
) -> Result<NetworkContext, ContextError> {
    let network_id = gateway.network_identifier().await?;
    let network =
        NetworkType::from_identifier(network_id).ok_or(ContextError::UnknownNetwork(network_id))?;
    debug!(network = %network_name(network_id), "fetched network identifier");

    let epoch_adjustment = gateway.epoch_adjustment().await?;
    let generation_hash = gateway.generation_hash().await?;
    let currency_id = gateway
        .currency_id()
        .await?
        .ok_or(ContextError::MissingCurrency)?;
    let fee_multiplier = gateway.fee_multipliers().await?.select(fee_strategy);

    info!(
        %network,
        epoch_adjustment,
        generation_hash = %generation_hash,
        currency = %currency_id,
        fee_multiplier,
        "network context fetched"
    );

    Ok(NetworkContext {
        network,
        epoch_adjustment,
        generation_hash,
        currency_id,
        fee_multiplier,
    })
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct CachedContext {
    context: Arc<NetworkContext>,
    fetched_at: Instant,
}

/// Explicitly scoped, explicitly refreshable network context.
///
/// Concurrent `get` calls on a cold or stale cache share one fetch: the
/// slot lock is held across it.
pub struct NetworkContextCache {
    gateway: Arc<dyn NodeGateway>,
    ttl: Duration,
    fee_strategy: FeeStrategy,
    slot: Mutex<Option<CachedContext>>,
}

impl NetworkContextCache {
    pub fn new(gateway: Arc<dyn NodeGateway>, ttl: Duration, fee_strategy: FeeStrategy) -> Self {
        Self {
            gateway,
            ttl,
            fee_strategy,
            slot: Mutex::new(None),
        }
    }

    /// The cached context, re-fetched if missing or older than the TTL.
    pub async fn get(&self) -> Result<Arc<NetworkContext>, ContextError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.context));
            }
            debug!(age = ?cached.fetched_at.elapsed(), "network context stale");
        }
        self.fill(&mut slot).await
    }

    /// Re-fetches unconditionally. On failure the previous value is dropped.
    pub async fn refresh(&self) -> Result<Arc<NetworkContext>, ContextError> {
        let mut slot = self.slot.lock().await;
        *slot = None;
        self.fill(&mut slot).await
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    async fn fill(&self, slot: &mut Option<CachedContext>) -> Result<Arc<NetworkContext>, ContextError> {
        let context = Arc::new(fetch_network_context(self.gateway.as_ref(), self.fee_strategy).await?);
        *slot = Some(CachedContext {
            context: Arc::clone(&context),
            fetched_at: Instant::now(),
        });
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::{MockGateway, Operation};

    #[tokio::test]
    async fn fetch_assembles_all_fields() {
        let gateway = MockGateway::testnet();
        let ctx = fetch_network_context(&gateway, FeeStrategy::Average).await.unwrap();
        assert_eq!(ctx.network, NetworkType::Testnet);
        assert_eq!(gateway.currency(), Some(ctx.currency_id));
        assert_eq!(ctx.generation_hash, gateway.generation_hash_value());
        assert_eq!(ctx.fee_multiplier, gateway.fees().average);
    }

    #[tokio::test]
    async fn mainnet_node_yields_mainnet_context() {
        let gateway = MockGateway::mainnet();
        let ctx = fetch_network_context(&gateway, FeeStrategy::Average).await.unwrap();
        assert_eq!(ctx.network, NetworkType::Mainnet);
        assert_eq!(ctx.currency_id, MosaicId(0x6BED_913F_A202_23F8));
        assert_eq!(ctx.generation_hash, gateway.generation_hash_value());
    }

    #[tokio::test]
    async fn fee_strategy_selects_multiplier() {
        let gateway = MockGateway::testnet();
        let ctx = fetch_network_context(&gateway, FeeStrategy::Highest).await.unwrap();
        assert_eq!(ctx.fee_multiplier, gateway.fees().highest);
    }

    #[tokio::test]
    async fn missing_currency_is_a_configuration_error() {
        let gateway = MockGateway::testnet();
        gateway.set_currency(None);
        assert_eq!(
            fetch_network_context(&gateway, FeeStrategy::Average).await,
            Err(ContextError::MissingCurrency)
        );
    }

    #[tokio::test]
    async fn any_step_failure_aborts_the_fetch() {
        for op in [
            Operation::NetworkIdentifier,
            Operation::EpochAdjustment,
            Operation::GenerationHash,
            Operation::CurrencyId,
            Operation::FeeMultipliers,
        ] {
            let gateway = MockGateway::testnet();
            gateway.fail(op);
            assert!(
                matches!(
                    fetch_network_context(&gateway, FeeStrategy::Average).await,
                    Err(ContextError::NetworkUnavailable(_))
                ),
                "{op:?} failure should abort"
            );
        }
    }

    #[tokio::test]
    async fn unknown_network_identifier_is_rejected() {
        let gateway = MockGateway::testnet();
        gateway.set_network_identifier(0x90);
        assert_eq!(
            fetch_network_context(&gateway, FeeStrategy::Average).await,
            Err(ContextError::UnknownNetwork(0x90))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cache_reuses_until_ttl_expires() {
        let gateway = Arc::new(MockGateway::testnet());
        let cache = NetworkContextCache::new(gateway.clone(), Duration::from_secs(600), FeeStrategy::Average);

        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(gateway.calls(Operation::NetworkIdentifier), 1);

        tokio::time::advance(Duration::from_secs(601)).await;
        cache.get().await.unwrap();
        assert_eq!(gateway.calls(Operation::NetworkIdentifier), 2);
    }

    #[tokio::test]
    async fn refresh_and_invalidate_force_refetch() {
        let gateway = Arc::new(MockGateway::testnet());
        let cache = NetworkContextCache::new(gateway.clone(), Duration::from_secs(600), FeeStrategy::Average);

        let before = cache.get().await.unwrap().fee_multiplier;
        gateway.set_fees_average(before + 899);
        assert_eq!(cache.get().await.unwrap().fee_multiplier, before);
        assert_eq!(cache.refresh().await.unwrap().fee_multiplier, before + 899);

        cache.invalidate().await;
        cache.get().await.unwrap();
        assert_eq!(gateway.calls(Operation::NetworkIdentifier), 3);
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_fetch() {
        let gateway = Arc::new(MockGateway::testnet());
        let cache = Arc::new(NetworkContextCache::new(
            gateway.clone(),
            Duration::from_secs(600),
            FeeStrategy::Average,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(gateway.calls(Operation::NetworkIdentifier), 1);
    }
}
