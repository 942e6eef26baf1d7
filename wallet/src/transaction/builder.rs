//! Transfer construction via the builder pattern.
//!
//! [`TransferTransactionBuilder`] turns a recipient string, an atomic amount
//! and a message into an unsigned [`TransferTransaction`] bound to one
//! [`NetworkContext`]. It does not sign; that happens in [`super::signing`],
//! which keeps construction testable without key material.
//!
//! The fee cap is computed from the real serialized size, so it is exact for
//! the multiplier the context carries.

use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use super::payload::{MOSAIC_SIZE, TRANSFER_HEADER_SIZE};
use super::types::{Deadline, Message, Mosaic, MosaicId, TypeError};
use crate::amount::AtomicAmount;
use crate::config::{NetworkType, DEFAULT_DEADLINE};
use crate::identity::address::{Address, AddressError};
use crate::network::context::NetworkContext;

/// Reasons a transfer could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("recipient is on {recipient}, transaction is for {network}")]
    RecipientNetworkMismatch {
        recipient: NetworkType,
        network: NetworkType,
    },

    #[error(transparent)]
    Message(#[from] TypeError),

    #[error("max fee overflows: multiplier {multiplier} x {size} bytes")]
    FeeOverflow { multiplier: u32, size: usize },

    #[error("clock reads before the network epoch")]
    ClockBeforeEpoch,
}

// ---------------------------------------------------------------------------
// TransferTransaction
// ---------------------------------------------------------------------------

/// An unsigned transfer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTransaction {
    pub network: NetworkType,
    pub deadline: Deadline,
    pub recipient: Address,
    /// Sorted ascending by id, as the wire format requires.
    pub mosaics: Vec<Mosaic>,
    pub message: Message,
    pub max_fee: AtomicAmount,
}

impl TransferTransaction {
    /// Serialized size in bytes, signature and signer included.
    pub fn size(&self) -> usize {
        transfer_size(self.mosaics.len(), self.message.len())
    }

    /// Amount of `id` carried by this transfer, 0 if absent.
    pub fn amount_of(&self, id: MosaicId) -> AtomicAmount {
        self.mosaics
            .iter()
            .filter(|m| m.id == id)
            .map(|m| m.amount)
            .fold(0, u64::saturating_add)
    }
}

fn transfer_size(mosaic_count: usize, message_len: usize) -> usize {
    TRANSFER_HEADER_SIZE + MOSAIC_SIZE * mosaic_count + message_len
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`TransferTransaction`].
///
/// ```rust,no_run
/// # use symbol_wallet::network::context::NetworkContext;
/// # use symbol_wallet::transaction::TransferTransactionBuilder;
/// # fn demo(ctx: &NetworkContext) -> Result<(), Box<dyn std::error::Error>> {
/// let tx = TransferTransactionBuilder::new(ctx)
///     .build("TBBXZ2-...", 10_000_000, "hello")?;
/// assert_eq!(tx.mosaics.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TransferTransactionBuilder<'a> {
    context: &'a NetworkContext,
    now_ms: Option<u64>,
    deadline_window: Duration,
}

impl<'a> TransferTransactionBuilder<'a> {
    pub fn new(context: &'a NetworkContext) -> Self {
        Self {
            context,
            now_ms: None,
            deadline_window: DEFAULT_DEADLINE,
        }
    }

    /// Pins "now" (Unix milliseconds). Defaults to the system clock.
    pub fn now_millis(mut self, now_ms: u64) -> Self {
        self.now_ms = Some(now_ms);
        self
    }

    /// Overrides the validity window. Defaults to two hours.
    pub fn deadline_window(mut self, window: Duration) -> Self {
        self.deadline_window = window;
        self
    }

    /// Builds a transfer of `amount` native currency to `recipient`.
    ///
    /// Zero amounts are allowed (message-only transfers). The native mosaic
    /// entry is still included so the recipient sees the currency id.
    pub fn build(
        &self,
        recipient: &str,
        amount: AtomicAmount,
        message: &str,
    ) -> Result<TransferTransaction, BuildError> {
        let recipient = Address::parse(recipient)?;
        let network = self.context.network;
        if recipient.network() != network {
            return Err(BuildError::RecipientNetworkMismatch {
                recipient: recipient.network(),
                network,
            });
        }

        let message = Message::plain(message)?;

        let now_ms = match self.now_ms {
            Some(ms) => ms,
            None => u64::try_from(Utc::now().timestamp_millis()).map_err(|_| BuildError::ClockBeforeEpoch)?,
        };
        let deadline = Deadline::from_unix_millis(now_ms, self.context.epoch_adjustment, self.deadline_window)
            .ok_or(BuildError::ClockBeforeEpoch)?;

        let mut mosaics = vec![Mosaic::new(self.context.currency_id, amount)];
        mosaics.sort_by_key(|m| m.id);

        let size = transfer_size(mosaics.len(), message.len());
        let multiplier = self.context.fee_multiplier;
        let max_fee = u64::from(multiplier)
            .checked_mul(size as u64)
            .ok_or(BuildError::FeeOverflow { multiplier, size })?;

        tracing::debug!(
            recipient = %recipient,
            amount,
            size,
            max_fee,
            deadline = deadline.0,
            "built transfer"
        );

        Ok(TransferTransaction {
            network,
            deadline,
            recipient,
            mosaics,
            message,
            max_fee,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::keypair::Keypair;
    use crate::transaction::types::GenerationHash;

    const EPOCH: u64 = 1_615_853_185;
    const NOW_MS: u64 = EPOCH * 1000 + 60_000;

    fn context() -> NetworkContext {
        NetworkContext {
            network: NetworkType::Testnet,
            epoch_adjustment: EPOCH,
            generation_hash: GenerationHash([0x49; 32]),
            currency_id: MosaicId(0x72C0_212E_67A0_8BCE),
            fee_multiplier: 100,
        }
    }

    fn recipient(network: NetworkType) -> String {
        Keypair::generate(network).address().to_string()
    }

    #[test]
    fn builds_single_mosaic_transfer() {
        let ctx = context();
        let to = recipient(NetworkType::Testnet);
        let tx = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&to, 10_000_000, "hello")
            .unwrap();

        assert_eq!(tx.recipient.to_string(), to);
        assert_eq!(tx.mosaics, vec![Mosaic::new(ctx.currency_id, 10_000_000)]);
        assert_eq!(tx.message.text(), Some("hello"));
        assert_eq!(tx.network, NetworkType::Testnet);
        assert_eq!(tx.deadline, Deadline(60_000 + 7_200_000));
    }

    #[test]
    fn max_fee_is_multiplier_times_size() {
        let ctx = context();
        let tx = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Testnet), 1, "hello")
            .unwrap();
        assert_eq!(tx.size(), 182);
        assert_eq!(tx.max_fee, 182 * 100);
    }

    #[test]
    fn zero_amount_message_only_transfer_is_allowed() {
        let ctx = context();
        let tx = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Testnet), 0, "just saying hi")
            .unwrap();
        assert_eq!(tx.amount_of(ctx.currency_id), 0);
        assert_eq!(tx.message.text(), Some("just saying hi"));
    }

    #[test]
    fn empty_message_adds_no_bytes() {
        let ctx = context();
        let tx = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Testnet), 5, "")
            .unwrap();
        assert_eq!(tx.size(), 176);
    }

    #[test]
    fn rejects_malformed_recipient() {
        let ctx = context();
        let err = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build("TNOTANADDRESS", 1, "")
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidAddress(_)));
    }

    #[test]
    fn rejects_recipient_from_other_network() {
        let ctx = context();
        let err = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Mainnet), 1, "")
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::RecipientNetworkMismatch {
                recipient: NetworkType::Mainnet,
                network: NetworkType::Testnet
            }
        );
    }

    #[test]
    fn rejects_oversized_message() {
        let ctx = context();
        let err = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Testnet), 1, &"x".repeat(2000))
            .unwrap_err();
        assert!(matches!(err, BuildError::Message(TypeError::MessageTooLarge { .. })));
    }

    #[test]
    fn largest_multiplier_still_fits() {
        let mut ctx = context();
        ctx.fee_multiplier = u32::MAX;
        let tx = TransferTransactionBuilder::new(&ctx)
            .now_millis(NOW_MS)
            .build(&recipient(NetworkType::Testnet), 1, "")
            .unwrap();
        assert_eq!(tx.max_fee, u64::from(u32::MAX) * 176);
    }

    #[test]
    fn clock_before_epoch_is_rejected() {
        let ctx = context();
        let err = TransferTransactionBuilder::new(&ctx)
            .now_millis(1_000)
            .build(&recipient(NetworkType::Testnet), 1, "")
            .unwrap_err();
        assert_eq!(err, BuildError::ClockBeforeEpoch);
    }
}
