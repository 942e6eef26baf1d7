//! In-memory [`NodeGateway`] for tests and demos.
//!
//! Holds settable network parameters and accounts, records announcements,
//! serves an injectable confirmed-lookup (optionally delayed) and lets the
//! caller push events into open subscriptions. Every operation can be made
//! to fail, and subscription open/close counts are exposed so tests can
//! assert that nothing leaked.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use super::gateway::{
    AccountInfo, AnnounceResponse, ChannelEvent, ConfirmedTransaction, FeeMultipliers,
    GatewayError, NodeGateway, Subscription,
};
use crate::config::{NETWORK_ID_MAINNET, NETWORK_ID_TESTNET};
use crate::identity::address::Address;
use crate::transaction::signing::SignedTransaction;
use crate::transaction::types::{GenerationHash, Mosaic, MosaicId, TransactionHash};

/// Public testnet generation hash seed.
pub const TESTNET_GENERATION_HASH: [u8; 32] = [
    0x49, 0xD6, 0xE1, 0xCE, 0x27, 0x6A, 0x85, 0xB7, 0x0E, 0xAF, 0xE5, 0x23, 0x49, 0xAA, 0xCC, 0xA3,
    0x89, 0x30, 0x2E, 0x7A, 0x97, 0x54, 0xBC, 0xF1, 0x22, 0x1E, 0x79, 0x49, 0x4F, 0xC6, 0x65, 0xA4,
];

/// Public mainnet generation hash seed.
pub const MAINNET_GENERATION_HASH: [u8; 32] = [
    0x57, 0xF7, 0xDA, 0x20, 0x50, 0x08, 0x02, 0x6C, 0x77, 0x6C, 0xB6, 0xAE, 0xD8, 0x43, 0x39, 0x3F,
    0x04, 0xCD, 0x45, 0x8E, 0x0A, 0xA2, 0xD9, 0xF1, 0xD5, 0xF3, 0x1A, 0x40, 0x20, 0x72, 0xB2, 0xD6,
];

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    NetworkIdentifier,
    EpochAdjustment,
    GenerationHash,
    CurrencyId,
    FeeMultipliers,
    AccountInfo,
    Announce,
    ConfirmedLookup,
    Subscribe,
}

type EventSender = mpsc::UnboundedSender<Result<ChannelEvent, GatewayError>>;

struct Subscriber {
    address: Address,
    sender: EventSender,
}

struct State {
    network_identifier: u8,
    epoch_adjustment: u64,
    generation_hash: GenerationHash,
    currency: Option<MosaicId>,
    fees: FeeMultipliers,
    accounts: HashMap<Address, AccountInfo>,
    confirmed: HashMap<TransactionHash, ConfirmedTransaction>,
    lookup_delay: Option<Duration>,
    announced: Vec<SignedTransaction>,
    rejection: Option<(u16, String)>,
    confirm_on_announce: Option<u64>,
    failures: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
    subscribers: Vec<Subscriber>,
}

/// In-memory node.
pub struct MockGateway {
    state: Mutex<State>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    subscribed: Notify,
}

impl MockGateway {
    fn with(network_identifier: u8, epoch_adjustment: u64, generation_hash: [u8; 32], currency: u64) -> Self {
        Self {
            state: Mutex::new(State {
                network_identifier,
                epoch_adjustment,
                generation_hash: GenerationHash(generation_hash),
                currency: Some(MosaicId(currency)),
                fees: FeeMultipliers {
                    average: 100,
                    median: 100,
                    highest: 1000,
                    lowest: 10,
                    minimum: 10,
                },
                accounts: HashMap::new(),
                confirmed: HashMap::new(),
                lookup_delay: None,
                announced: Vec::new(),
                rejection: None,
                confirm_on_announce: None,
                failures: HashSet::new(),
                calls: HashMap::new(),
                subscribers: Vec::new(),
            }),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            subscribed: Notify::new(),
        }
    }

    /// A node reporting the public testnet's parameters.
    pub fn testnet() -> Self {
        Self::with(NETWORK_ID_TESTNET, 1_667_250_467, TESTNET_GENERATION_HASH, 0x72C0_212E_67A0_8BCE)
    }

    /// A node reporting the public mainnet's parameters.
    pub fn mainnet() -> Self {
        Self::with(NETWORK_ID_MAINNET, 1_615_853_185, MAINNET_GENERATION_HASH, 0x6BED_913F_A202_23F8)
    }

    // -- parameters ---------------------------------------------------------

    pub fn set_network_identifier(&self, id: u8) {
        self.state.lock().network_identifier = id;
    }

    pub fn generation_hash_value(&self) -> GenerationHash {
        self.state.lock().generation_hash
    }

    pub fn set_currency(&self, currency: Option<MosaicId>) {
        self.state.lock().currency = currency;
    }

    pub fn currency(&self) -> Option<MosaicId> {
        self.state.lock().currency
    }

    pub fn set_fees_average(&self, average: u32) {
        self.state.lock().fees.average = average;
    }

    pub fn fees(&self) -> FeeMultipliers {
        self.state.lock().fees
    }

    // -- accounts -----------------------------------------------------------

    /// Sets the holdings of `address`, creating the account if needed.
    pub fn set_account(&self, address: Address, mosaics: Vec<Mosaic>) {
        self.state
            .lock()
            .accounts
            .insert(address, AccountInfo { address, mosaics });
    }

    // -- announcements ------------------------------------------------------

    pub fn announced(&self) -> Vec<SignedTransaction> {
        self.state.lock().announced.clone()
    }

    /// Makes every following announce fail with this status and body.
    pub fn reject_announcements(&self, status: u16, body: impl Into<String>) {
        self.state.lock().rejection = Some((status, body.into()));
    }

    /// Marks announced transactions confirmed at `height` and notifies the
    /// signer's open subscriptions.
    pub fn confirm_on_announce(&self, height: u64) {
        self.state.lock().confirm_on_announce = Some(height);
    }

    // -- confirmed lookup ---------------------------------------------------

    pub fn set_confirmed(&self, hash: TransactionHash, height: u64) {
        self.state
            .lock()
            .confirmed
            .insert(hash, ConfirmedTransaction { hash, height });
    }

    /// Delays every confirmed lookup by `delay` (tokio time).
    pub fn set_lookup_delay(&self, delay: Duration) {
        self.state.lock().lookup_delay = Some(delay);
    }

    // -- push channel -------------------------------------------------------

    /// Sends `event` to every open subscription for `address`. Returns how
    /// many received it.
    pub fn emit(&self, address: &Address, event: ChannelEvent) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|s| !s.sender.is_closed());
        state
            .subscribers
            .iter()
            .filter(|s| s.address == *address)
            .filter(|s| s.sender.send(Ok(event.clone())).is_ok())
            .count()
    }

    /// Sends an error to every open subscription for `address`.
    pub fn emit_error(&self, address: &Address, error: GatewayError) {
        let state = self.state.lock();
        for subscriber in state.subscribers.iter().filter(|s| s.address == *address) {
            let _ = subscriber.sender.send(Err(error.clone()));
        }
    }

    /// Ends every open subscription for `address`, as a dropped socket would.
    pub fn disconnect(&self, address: &Address) {
        self.state.lock().subscribers.retain(|s| s.address != *address);
    }

    /// Resolves once at least `count` subscriptions for `address` are open.
    pub async fn wait_for_subscribers(&self, address: &Address, count: usize) {
        loop {
            let notified = self.subscribed.notified();
            if self.open_subscribers(address) >= count {
                return;
            }
            notified.await;
        }
    }

    fn open_subscribers(&self, address: &Address) -> usize {
        self.state
            .lock()
            .subscribers
            .iter()
            .filter(|s| s.address == *address && !s.sender.is_closed())
            .count()
    }

    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn subscriptions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Opened minus closed.
    pub fn open_subscriptions(&self) -> usize {
        self.subscriptions_opened()
            .saturating_sub(self.subscriptions_closed())
    }

    // -- failure injection --------------------------------------------------

    pub fn fail(&self, op: Operation) {
        self.state.lock().failures.insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.state.lock().failures.remove(&op);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Counts the call and returns the injected failure, if any.
    fn enter(&self, op: Operation) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if state.failures.contains(&op) {
            return Err(GatewayError::Transport(format!("injected failure: {:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeGateway for MockGateway {
    async fn network_identifier(&self) -> Result<u8, GatewayError> {
        self.enter(Operation::NetworkIdentifier)?;
        Ok(self.state.lock().network_identifier)
    }

    async fn epoch_adjustment(&self) -> Result<u64, GatewayError> {
        self.enter(Operation::EpochAdjustment)?;
        Ok(self.state.lock().epoch_adjustment)
    }

    async fn generation_hash(&self) -> Result<GenerationHash, GatewayError> {
        self.enter(Operation::GenerationHash)?;
        Ok(self.state.lock().generation_hash)
    }

    async fn currency_id(&self) -> Result<Option<MosaicId>, GatewayError> {
        self.enter(Operation::CurrencyId)?;
        Ok(self.state.lock().currency)
    }

    async fn fee_multipliers(&self) -> Result<FeeMultipliers, GatewayError> {
        self.enter(Operation::FeeMultipliers)?;
        Ok(self.state.lock().fees)
    }

    async fn account_info(&self, address: &Address) -> Result<Option<AccountInfo>, GatewayError> {
        self.enter(Operation::AccountInfo)?;
        Ok(self.state.lock().accounts.get(address).cloned())
    }

    async fn announce(&self, signed: &SignedTransaction) -> Result<AnnounceResponse, GatewayError> {
        self.enter(Operation::Announce)?;
        let mut state = self.state.lock();
        if let Some((status, body)) = state.rejection.clone() {
            return Err(GatewayError::Http { status, body });
        }
        state.announced.push(signed.clone());

        if let Some(height) = state.confirm_on_announce {
            let hash = signed.hash();
            state.confirmed.insert(hash, ConfirmedTransaction { hash, height });
            for subscriber in state
                .subscribers
                .iter()
                .filter(|s| s.address == *signed.signer_address())
            {
                let _ = subscriber.sender.send(Ok(ChannelEvent::Confirmed { hash, height }));
            }
        }

        Ok(AnnounceResponse {
            message: "packet 9 was pushed to the network via /transactions".to_string(),
        })
    }

    async fn confirmed_transaction(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ConfirmedTransaction>, GatewayError> {
        self.enter(Operation::ConfirmedLookup)?;
        let delay = self.state.lock().lookup_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state.lock().confirmed.get(hash).copied())
    }

    async fn subscribe(&self, address: &Address) -> Result<Box<dyn Subscription>, GatewayError> {
        self.enter(Operation::Subscribe)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(Subscriber {
            address: *address,
            sender,
        });
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.subscribed.notify_waiters();
        Ok(Box::new(MockSubscription {
            receiver,
            closed: false,
            closed_counter: Arc::clone(&self.closed),
        }))
    }
}

/// Subscription handed out by [`MockGateway`]. Does not close itself on
/// drop, so a missing `close` shows up in the counters.
pub struct MockSubscription {
    receiver: mpsc::UnboundedReceiver<Result<ChannelEvent, GatewayError>>,
    closed: bool,
    closed_counter: Arc<AtomicUsize>,
}

#[async_trait]
impl Subscription for MockSubscription {
    async fn next_event(&mut self) -> Result<ChannelEvent, GatewayError> {
        match self.receiver.recv().await {
            Some(event) => event,
            None => Err(GatewayError::ChannelClosed),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.receiver.close();
        self.closed_counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;
    use crate::identity::keypair::Keypair;

    #[tokio::test]
    async fn events_reach_only_matching_subscribers() {
        let gateway = MockGateway::testnet();
        let alice = *Keypair::generate(NetworkType::Testnet).address();
        let bob = *Keypair::generate(NetworkType::Testnet).address();

        let mut sub = gateway.subscribe(&alice).await.unwrap();
        let _other = gateway.subscribe(&bob).await.unwrap();

        assert_eq!(gateway.emit(&alice, ChannelEvent::Block { height: 7 }), 1);
        assert_eq!(sub.next_event().await.unwrap(), ChannelEvent::Block { height: 7 });
    }

    #[tokio::test]
    async fn close_is_idempotent_and_counted() {
        let gateway = MockGateway::testnet();
        let alice = *Keypair::generate(NetworkType::Testnet).address();
        let mut sub = gateway.subscribe(&alice).await.unwrap();
        assert_eq!(gateway.open_subscriptions(), 1);

        sub.close();
        sub.close();
        assert_eq!(gateway.subscriptions_closed(), 1);
        assert_eq!(gateway.open_subscriptions(), 0);
        assert_eq!(gateway.emit(&alice, ChannelEvent::Block { height: 1 }), 0);
    }

    #[tokio::test]
    async fn disconnect_ends_the_stream() {
        let gateway = MockGateway::testnet();
        let alice = *Keypair::generate(NetworkType::Testnet).address();
        let mut sub = gateway.subscribe(&alice).await.unwrap();
        gateway.disconnect(&alice);
        assert_eq!(sub.next_event().await, Err(GatewayError::ChannelClosed));
    }

    #[tokio::test]
    async fn injected_failures_are_counted() {
        let gateway = MockGateway::testnet();
        gateway.fail(Operation::EpochAdjustment);
        assert!(gateway.epoch_adjustment().await.is_err());
        gateway.recover(Operation::EpochAdjustment);
        assert!(gateway.epoch_adjustment().await.is_ok());
        assert_eq!(gateway.calls(Operation::EpochAdjustment), 2);
    }

    #[test]
    fn generation_hash_constants_match_hex() {
        assert_eq!(
            GenerationHash(TESTNET_GENERATION_HASH).to_hex(),
            "49D6E1CE276A85B70EAFE52349AACCA389302E7A9754BCF1221E79494FC665A4"
        );
        assert_eq!(
            GenerationHash(MAINNET_GENERATION_HASH).to_hex(),
            "57F7DA205008026C776CB6AED843393F04CD458E0AA2D9F1D5F31A402072B2D6"
        );
    }
}
