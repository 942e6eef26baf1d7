//! # Wallet Client
//!
//! The caller-facing API. One [`WalletClient`] owns one gateway and the
//! state scoped to it: the network context cache, the account service, the
//! announcer and the confirmation waiter.
//!
//! ```text
//! send_transfer:  to_atomic -> context -> build -> sign -> announce
//! await_*:        subscribe -> (lookup | channel | deadline | cancel)
//! ```
//!
//! The send path is strictly sequential. Each step must succeed before the
//! next begins, and nothing is retried.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::account::AccountService;
use crate::amount::{to_atomic, AtomicAmount};
use crate::config::ClientConfig;
use crate::crypto::keys::PrivateKey;
use crate::error::WalletError;
use crate::identity::address::Address;
use crate::identity::keypair::{InvalidSecret, Keypair};
use crate::lifecycle::announcer::{AnnouncementReceipt, Announcer};
use crate::lifecycle::confirmation::{ConfirmationHandle, ConfirmationState, ConfirmationWaiter};
use crate::network::context::{NetworkContext, NetworkContextCache};
use crate::network::gateway::NodeGateway;
use crate::network::http::HttpGateway;
use crate::transaction::builder::TransferTransactionBuilder;
use crate::transaction::signing::{sign, SignedTransaction};
use crate::transaction::types::TransactionHash;

/// Result of a successful [`WalletClient::send_transfer`].
#[derive(Debug, Clone)]
pub struct SentTransfer {
    pub keypair: Keypair,
    pub signed: SignedTransaction,
    pub receipt: AnnouncementReceipt,
}

pub struct WalletClient {
    config: ClientConfig,
    gateway: Arc<dyn NodeGateway>,
    context: NetworkContextCache,
    accounts: AccountService,
    announcer: Announcer,
    waiter: ConfirmationWaiter,
}

impl WalletClient {
    /// Client for the live node described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self, WalletError> {
        config.validate()?;
        let gateway = HttpGateway::new(&config)
            .map_err(|e| WalletError::Configuration(format!("http client: {}", e)))?;
        Ok(Self::with_gateway(Arc::new(gateway), config))
    }

    /// Client over any gateway (tests use the in-memory one).
    pub fn with_gateway(gateway: Arc<dyn NodeGateway>, config: ClientConfig) -> Self {
        Self {
            context: NetworkContextCache::new(gateway.clone(), config.context_ttl, config.fee_strategy),
            accounts: AccountService::new(gateway.clone(), config.network),
            announcer: Announcer::new(gateway.clone()),
            waiter: ConfirmationWaiter::new(gateway.clone(), config.confirmation_timeout),
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn NodeGateway> {
        &self.gateway
    }

    /// The cached network context, fetched if missing or stale.
    pub async fn context(&self) -> Result<Arc<NetworkContext>, WalletError> {
        Ok(self.context.get().await?)
    }

    /// Forces a fresh context fetch.
    pub async fn refresh_context(&self) -> Result<Arc<NetworkContext>, WalletError> {
        Ok(self.context.refresh().await?)
    }

    // -- accounts -----------------------------------------------------------

    /// New random account on the configured network. The caller must show
    /// or store the secret; the client keeps nothing.
    pub fn create_account(&self) -> Keypair {
        self.accounts.generate_keypair()
    }

    /// Native currency balance of `address`, in atomic units. Addresses the
    /// node has never seen report 0.
    pub async fn get_balance(&self, address: &str) -> Result<AtomicAmount, WalletError> {
        let address = Address::parse(address)?;
        let context = self.context().await?;
        Ok(self.accounts.get_balance(&address, &context).await?)
    }

    // -- sending ------------------------------------------------------------

    /// Builds and signs a transfer without announcing it.
    ///
    /// Input formats are checked before any network call.
    pub async fn prepare_transfer(
        &self,
        recipient: &str,
        amount_display: &str,
        message: &str,
        sender_secret: &str,
    ) -> Result<(Keypair, SignedTransaction), WalletError> {
        let amount = to_atomic(amount_display.trim())?;
        let private_key = PrivateKey::from_hex(sender_secret.trim()).map_err(InvalidSecret)?;

        let context = self.context().await?;
        let keypair = Keypair::from_private_key(private_key, context.network);
        let transaction = TransferTransactionBuilder::new(&context).build(recipient, amount, message)?;
        let signed = sign(&transaction, &keypair, &context.generation_hash)?;
        Ok((keypair, signed))
    }

    /// Builds, signs and announces a transfer of `amount_display` XYM.
    ///
    /// Resolves once the node accepts the payload. That is not confirmation;
    /// follow up with [`Self::await_confirmation`].
    pub async fn send_transfer(
        &self,
        recipient: &str,
        amount_display: &str,
        message: &str,
        sender_secret: &str,
    ) -> Result<SentTransfer, WalletError> {
        let (keypair, signed) = self
            .prepare_transfer(recipient, amount_display, message, sender_secret)
            .await?;
        let receipt = self.announcer.announce(&signed).await?;
        info!(hash = %receipt.hash, recipient, amount = amount_display, "transfer sent");
        Ok(SentTransfer {
            keypair,
            signed,
            receipt,
        })
    }

    /// Announces an already signed transaction.
    pub async fn announce(&self, signed: &SignedTransaction) -> Result<AnnouncementReceipt, WalletError> {
        Ok(self.announcer.announce(signed).await?)
    }

    // -- confirmation -------------------------------------------------------

    /// Waits for `signed` with the configured timeout.
    pub async fn await_confirmation(&self, keypair: &Keypair, signed: &SignedTransaction) -> ConfirmationState {
        self.await_confirmation_with(
            keypair.address(),
            signed.hash(),
            self.config.confirmation_timeout,
            &CancellationToken::new(),
        )
        .await
    }

    /// Waits for `hash` signed by `signer`, abandoning on `cancel`.
    pub async fn await_confirmation_with(
        &self,
        signer: &Address,
        hash: TransactionHash,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ConfirmationState {
        self.waiter.wait_for(signer, hash, timeout, cancel).await.into()
    }

    /// Background wait. Dropping the handle cancels it.
    pub fn watch_confirmation(&self, signed: &SignedTransaction) -> ConfirmationHandle {
        self.waiter
            .spawn(*signed.signer_address(), signed.hash(), self.config.confirmation_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;
    use crate::error::{ErrorClass, FormatError};
    use crate::network::mock::{MockGateway, Operation};

    fn client() -> (Arc<MockGateway>, WalletClient) {
        let gateway = Arc::new(MockGateway::testnet());
        let client = WalletClient::with_gateway(gateway.clone(), ClientConfig::default());
        (gateway, client)
    }

    #[tokio::test]
    async fn malformed_inputs_fail_before_any_network_call() {
        let (gateway, client) = client();
        let recipient = Keypair::generate(NetworkType::Testnet).address().encoded();
        let secret = "1".repeat(64);

        let err = client
            .send_transfer(&recipient, "1.2345678", "", &secret)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Format(FormatError::Amount(_))));

        let err = client.send_transfer(&recipient, "1", "", "not-hex").await.unwrap_err();
        assert!(matches!(err, WalletError::Format(FormatError::Secret(_))));

        assert_eq!(gateway.calls(Operation::NetworkIdentifier), 0);
        assert!(gateway.announced().is_empty());
    }

    #[tokio::test]
    async fn bad_recipient_is_a_format_error() {
        let (gateway, client) = client();
        let err = client
            .send_transfer("TABC", "1", "", &"1".repeat(64))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Format);
        assert!(gateway.announced().is_empty());
    }

    #[tokio::test]
    async fn context_failure_is_retryable() {
        let (gateway, client) = client();
        gateway.fail(Operation::GenerationHash);
        let address = client.create_account().address().encoded();
        let err = client.get_balance(&address).await.unwrap_err();
        assert!(err.is_retryable());

        gateway.recover(Operation::GenerationHash);
        assert_eq!(client.get_balance(&address).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_currency_is_fatal() {
        let (gateway, client) = client();
        gateway.set_currency(None);
        let address = client.create_account().address().encoded();
        let err = client.get_balance(&address).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Configuration);
        assert!(!err.is_retryable());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig::for_node("ftp://node");
        assert!(matches!(WalletClient::new(config), Err(WalletError::Configuration(_))));
    }
}
