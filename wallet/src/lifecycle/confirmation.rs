//! # Confirmation Tracking
//!
//! Waits until a transaction is confirmed, rejected, timed out or abandoned.
//!
//! ```text
//! Idle -> Subscribing -> Waiting -> Confirmed
//!                              \-> Failed      (timeout, rejection, channel error)
//!                              \-> Cancelled   (token fired or handle dropped)
//! ```
//!
//! The push subscription is opened *before* the one-shot confirmed lookup
//! starts. A confirmation that lands before the subscription exists is
//! therefore seen by the lookup, and one that lands after is seen by the
//! channel. Both run inside the same `select!` loop together with the
//! deadline and the cancellation token; the loop breaks on the first
//! terminal result, so the wait resolves exactly once.
//!
//! The subscription lives in a guard that closes it on drop. Every exit
//! path (including dropping the future mid-wait) tears it down.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::identity::address::Address;
use crate::network::gateway::{
    ChannelEvent, ConfirmedTransaction, GatewayError, NodeGateway, Subscription,
};
use crate::transaction::types::TransactionHash;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Where a wait currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    Idle,
    Subscribing,
    Waiting,
    Confirmed,
    Failed,
    Cancelled,
}

impl WaitPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::Cancelled)
    }
}

/// Why a wait ended without confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("transaction {hash} not confirmed within {timeout:?}")]
    Timeout {
        hash: TransactionHash,
        timeout: Duration,
    },

    #[error("transaction {hash} rejected by the network: {code}")]
    Rejected { hash: TransactionHash, code: String },

    #[error("wait for transaction {hash} cancelled")]
    Cancelled { hash: TransactionHash },

    #[error("push channel failed: {0}")]
    NetworkUnavailable(GatewayError),
}

/// Outcome of a confirmation wait. Moves out of `Pending` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    Pending,
    Confirmed(ConfirmedTransaction),
    Failed(ConfirmationError),
}

impl ConfirmationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<Result<ConfirmedTransaction, ConfirmationError>> for ConfirmationState {
    fn from(result: Result<ConfirmedTransaction, ConfirmationError>) -> Self {
        match result {
            Ok(confirmed) => Self::Confirmed(confirmed),
            Err(err) => Self::Failed(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription guard
// ---------------------------------------------------------------------------

/// Owns a subscription and closes it when dropped.
struct SubscriptionGuard {
    inner: Box<dyn Subscription>,
}

impl SubscriptionGuard {
    async fn next_event(&mut self) -> Result<ChannelEvent, GatewayError> {
        self.inner.next_event().await
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

// ---------------------------------------------------------------------------
// Waiter
// ---------------------------------------------------------------------------

/// Confirmation tracker for transactions signed by any address.
///
/// Cheap to clone. Concurrent waits each open their own subscription and
/// share nothing but the gateway.
#[derive(Clone)]
pub struct ConfirmationWaiter {
    gateway: Arc<dyn NodeGateway>,
    timeout: Duration,
}

impl ConfirmationWaiter {
    pub fn new(gateway: Arc<dyn NodeGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits with the default timeout until `hash` (signed by `signer`)
    /// resolves or `cancel` fires.
    pub async fn wait(
        &self,
        signer: &Address,
        hash: TransactionHash,
        cancel: &CancellationToken,
    ) -> Result<ConfirmedTransaction, ConfirmationError> {
        let (phase, _) = watch::channel(WaitPhase::Idle);
        self.run(signer, hash, self.timeout, cancel, &phase).await
    }

    /// Same as [`Self::wait`] with an explicit timeout.
    pub async fn wait_for(
        &self,
        signer: &Address,
        hash: TransactionHash,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ConfirmedTransaction, ConfirmationError> {
        let (phase, _) = watch::channel(WaitPhase::Idle);
        self.run(signer, hash, timeout, cancel, &phase).await
    }

    /// Runs the wait on a background task and returns a handle to observe
    /// or cancel it. Dropping the handle cancels the wait.
    pub fn spawn(&self, signer: Address, hash: TransactionHash, timeout: Duration) -> ConfirmationHandle {
        let (phase_tx, phase_rx) = watch::channel(WaitPhase::Idle);
        let (state_tx, state_rx) = watch::channel(ConfirmationState::Pending);
        let cancel = CancellationToken::new();

        let waiter = self.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let result = waiter.run(&signer, hash, timeout, &task_cancel, &phase_tx).await;
            state_tx.send_replace(result.into());
        });

        ConfirmationHandle {
            hash,
            phase: phase_rx,
            state: state_rx,
            cancel,
        }
    }

    async fn run(
        &self,
        signer: &Address,
        hash: TransactionHash,
        timeout: Duration,
        cancel: &CancellationToken,
        phase: &watch::Sender<WaitPhase>,
    ) -> Result<ConfirmedTransaction, ConfirmationError> {
        let result = self.race(signer, hash, timeout, cancel, phase).await;
        let terminal = match &result {
            Ok(confirmed) => {
                info!(%hash, height = confirmed.height, "transaction confirmed");
                WaitPhase::Confirmed
            }
            Err(ConfirmationError::Cancelled { .. }) => {
                debug!(%hash, "confirmation wait cancelled");
                WaitPhase::Cancelled
            }
            Err(err) => {
                warn!(%hash, error = %err, "confirmation wait failed");
                WaitPhase::Failed
            }
        };
        phase.send_replace(terminal);
        result
    }

    async fn race(
        &self,
        signer: &Address,
        hash: TransactionHash,
        timeout: Duration,
        cancel: &CancellationToken,
        phase: &watch::Sender<WaitPhase>,
    ) -> Result<ConfirmedTransaction, ConfirmationError> {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        phase.send_replace(WaitPhase::Subscribing);
        debug!(%hash, %signer, "subscribing for confirmation");
        let subscription = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConfirmationError::Cancelled { hash }),
            _ = &mut deadline => return Err(ConfirmationError::Timeout { hash, timeout }),
            opened = self.gateway.subscribe(signer) => {
                opened.map_err(ConfirmationError::NetworkUnavailable)?
            }
        };
        let mut guard = SubscriptionGuard { inner: subscription };

        phase.send_replace(WaitPhase::Waiting);
        let lookup = self.gateway.confirmed_transaction(&hash);
        tokio::pin!(lookup);
        let mut lookup_done = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ConfirmationError::Cancelled { hash }),
                _ = &mut deadline => return Err(ConfirmationError::Timeout { hash, timeout }),
                found = &mut lookup, if !lookup_done => {
                    lookup_done = true;
                    match found {
                        Ok(Some(confirmed)) => {
                            debug!(%hash, "already confirmed at lookup");
                            return Ok(confirmed);
                        }
                        Ok(None) => trace!(%hash, "not confirmed yet, waiting on push channel"),
                        Err(err) => warn!(%hash, error = %err, "confirmed lookup failed, waiting on push channel"),
                    }
                }
                event = guard.next_event() => match event {
                    Ok(ChannelEvent::Confirmed { hash: seen, height }) if seen == hash => {
                        return Ok(ConfirmedTransaction { hash, height });
                    }
                    Ok(ChannelEvent::Status { hash: seen, code }) if seen == hash => {
                        return Err(ConfirmationError::Rejected { hash, code });
                    }
                    Ok(ChannelEvent::Block { height }) => trace!(height, "block keep-alive"),
                    Ok(other) => trace!(?other, "event for another transaction"),
                    Err(err) => return Err(ConfirmationError::NetworkUnavailable(err)),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Observes and controls a wait started with [`ConfirmationWaiter::spawn`].
pub struct ConfirmationHandle {
    hash: TransactionHash,
    phase: watch::Receiver<WaitPhase>,
    state: watch::Receiver<ConfirmationState>,
    cancel: CancellationToken,
}

impl ConfirmationHandle {
    pub fn hash(&self) -> TransactionHash {
        self.hash
    }

    pub fn phase(&self) -> WaitPhase {
        *self.phase.borrow()
    }

    /// Receiver for phase changes.
    pub fn phases(&self) -> watch::Receiver<WaitPhase> {
        self.phase.clone()
    }

    pub fn state(&self) -> ConfirmationState {
        self.state.borrow().clone()
    }

    /// Abandons the wait. The subscription is closed by the task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves with the terminal state.
    pub async fn outcome(mut self) -> ConfirmationState {
        match self.state.wait_for(ConfirmationState::is_terminal).await {
            Ok(state) => state.clone(),
            // The task ended without publishing; only a panic does that.
            Err(_) => ConfirmationState::Failed(ConfirmationError::Cancelled { hash: self.hash }),
        }
    }
}

impl Drop for ConfirmationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;
    use crate::identity::keypair::Keypair;
    use crate::network::mock::{MockGateway, Operation};

    fn setup() -> (Arc<MockGateway>, ConfirmationWaiter, Address, TransactionHash) {
        let gateway = Arc::new(MockGateway::testnet());
        let waiter = ConfirmationWaiter::new(gateway.clone(), Duration::from_secs(60));
        let signer = *Keypair::generate(NetworkType::Testnet).address();
        (gateway, waiter, signer, TransactionHash([0xAB; 32]))
    }

    #[tokio::test]
    async fn resolves_from_lookup_when_already_confirmed() {
        let (gateway, waiter, signer, hash) = setup();
        gateway.set_confirmed(hash, 42);

        let confirmed = waiter.wait(&signer, hash, &CancellationToken::new()).await.unwrap();
        assert_eq!(confirmed, ConfirmedTransaction { hash, height: 42 });
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn resolves_from_channel_and_ignores_keep_alives() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));

        gateway.wait_for_subscribers(&signer, 1).await;
        gateway.emit(&signer, ChannelEvent::Block { height: 1 });
        gateway.emit(&signer, ChannelEvent::Confirmed { hash: TransactionHash([0xCD; 32]), height: 2 });
        gateway.emit(&signer, ChannelEvent::Block { height: 3 });
        gateway.emit(&signer, ChannelEvent::Confirmed { hash, height: 3 });

        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Confirmed(ConfirmedTransaction { hash, height: 3 })
        );
        assert_eq!(gateway.subscriptions_closed(), 1);
    }

    #[tokio::test]
    async fn status_event_fails_the_wait() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));

        gateway.wait_for_subscribers(&signer, 1).await;
        gateway.emit(
            &signer,
            ChannelEvent::Status { hash, code: "Failure_Core_Past_Deadline".to_string() },
        );

        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Failed(ConfirmationError::Rejected {
                hash,
                code: "Failure_Core_Past_Deadline".to_string()
            })
        );
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_closes_subscription() {
        let (gateway, waiter, signer, hash) = setup();
        let result = waiter
            .wait_for(&signer, hash, Duration::from_secs(30), &CancellationToken::new())
            .await;
        assert_eq!(
            result,
            Err(ConfirmationError::Timeout { hash, timeout: Duration::from_secs(30) })
        );
        assert_eq!(gateway.subscriptions_opened(), 1);
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn cancellation_closes_subscription() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));
        gateway.wait_for_subscribers(&signer, 1).await;

        handle.cancel();
        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Failed(ConfirmationError::Cancelled { hash })
        );
        assert_eq!(gateway.subscriptions_closed(), 1);
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));
        let mut phases = handle.phases();
        gateway.wait_for_subscribers(&signer, 1).await;

        drop(handle);
        phases.wait_for(|p| p.is_terminal()).await.unwrap();
        assert_eq!(*phases.borrow(), WaitPhase::Cancelled);
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn failed_lookup_keeps_waiting_on_channel() {
        let (gateway, waiter, signer, hash) = setup();
        gateway.fail(Operation::ConfirmedLookup);
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));

        gateway.wait_for_subscribers(&signer, 1).await;
        gateway.emit(&signer, ChannelEvent::Confirmed { hash, height: 9 });
        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Confirmed(ConfirmedTransaction { hash, height: 9 })
        );
    }

    #[tokio::test]
    async fn channel_error_fails_the_wait() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));
        gateway.wait_for_subscribers(&signer, 1).await;
        gateway.disconnect(&signer);

        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Failed(ConfirmationError::NetworkUnavailable(GatewayError::ChannelClosed))
        );
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn transport_error_on_channel_fails_the_wait() {
        let (gateway, waiter, signer, hash) = setup();
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));
        handle
            .phases()
            .wait_for(|phase| *phase == WaitPhase::Waiting)
            .await
            .unwrap();
        assert_eq!(handle.phase(), WaitPhase::Waiting);

        let error = GatewayError::Transport("connection reset".to_string());
        gateway.emit_error(&signer, error.clone());
        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Failed(ConfirmationError::NetworkUnavailable(error))
        );
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn subscribe_failure_is_network_unavailable() {
        let (gateway, waiter, signer, hash) = setup();
        gateway.fail(Operation::Subscribe);
        assert!(matches!(
            waiter.wait(&signer, hash, &CancellationToken::new()).await,
            Err(ConfirmationError::NetworkUnavailable(_))
        ));
        assert_eq!(gateway.calls(Operation::ConfirmedLookup), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn channel_wins_over_slow_lookup_exactly_once() {
        let (gateway, waiter, signer, hash) = setup();
        gateway.set_lookup_delay(Duration::from_secs(10));
        gateway.set_confirmed(hash, 5);
        let handle = waiter.spawn(signer, hash, Duration::from_secs(60));

        gateway.wait_for_subscribers(&signer, 1).await;
        gateway.emit(&signer, ChannelEvent::Confirmed { hash, height: 6 });
        // The channel event arrives first; the lookup's later answer is ignored.
        assert_eq!(
            handle.outcome().await,
            ConfirmationState::Confirmed(ConfirmedTransaction { hash, height: 6 })
        );
    }

    #[test]
    fn terminal_phases() {
        assert!(!WaitPhase::Idle.is_terminal());
        assert!(!WaitPhase::Waiting.is_terminal());
        assert!(WaitPhase::Cancelled.is_terminal());
        assert!(!ConfirmationState::Pending.is_terminal());
    }
}
