//! Error taxonomy of the caller-facing API.
//!
//! Every module has its own error enum. [`WalletError`] folds them into the
//! handful of classes a caller actually branches on: fix the input, retry
//! later, give up for this session, or report the network's verdict.

use std::time::Duration;
use thiserror::Error;

use crate::account::AccountError;
use crate::amount::AmountError;
use crate::config::{ConfigError, NetworkType};
use crate::identity::address::AddressError;
use crate::identity::keypair::InvalidSecret;
use crate::lifecycle::announcer::AnnounceError;
use crate::lifecycle::confirmation::ConfirmationError;
use crate::network::context::ContextError;
use crate::network::gateway::GatewayError;
use crate::transaction::builder::BuildError;
use crate::transaction::signing::SigningError;
use crate::transaction::types::{TransactionHash, TypeError};

/// Malformed user input. Always correctable by the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    #[error(transparent)]
    Secret(#[from] InvalidSecret),

    #[error(transparent)]
    Message(#[from] TypeError),

    /// Well-formed address, wrong network.
    #[error("address is on {address}, expected {expected}")]
    WrongNetwork {
        address: NetworkType,
        expected: NetworkType,
    },
}

/// Any failure surfaced by [`crate::client::WalletClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Node unreachable, timed out, or answered garbage. Retryable.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(GatewayError),

    /// The node or the local setup is unusable for this session.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The node refused the announcement. `body` is what it sent.
    #[error("rejected by node (HTTP {status}): {body}")]
    RejectedByNode { status: u16, body: String },

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("transaction {hash} not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        hash: TransactionHash,
        timeout: Duration,
    },

    #[error("transaction {hash} rejected by the network: {code}")]
    TransactionRejected { hash: TransactionHash, code: String },

    #[error("wait for transaction {hash} cancelled")]
    Cancelled { hash: TransactionHash },
}

/// Coarse class of a [`WalletError`], for callers mapping errors to UI
/// states or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Format,
    NetworkUnavailable,
    Configuration,
    RejectedByNode,
    Signing,
    ConfirmationTimeout,
    TransactionRejected,
    Cancelled,
}

impl WalletError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Format(_) => ErrorClass::Format,
            Self::NetworkUnavailable(_) => ErrorClass::NetworkUnavailable,
            Self::Configuration(_) => ErrorClass::Configuration,
            Self::RejectedByNode { .. } => ErrorClass::RejectedByNode,
            Self::Signing(_) => ErrorClass::Signing,
            Self::ConfirmationTimeout { .. } => ErrorClass::ConfirmationTimeout,
            Self::TransactionRejected { .. } => ErrorClass::TransactionRejected,
            Self::Cancelled { .. } => ErrorClass::Cancelled,
        }
    }

    /// Whether retrying the same call later can succeed. Only transport
    /// failures qualify; nothing else is retried automatically either.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        Self::Format(err.into())
    }
}

impl From<AddressError> for WalletError {
    fn from(err: AddressError) -> Self {
        Self::Format(err.into())
    }
}

impl From<InvalidSecret> for WalletError {
    fn from(err: InvalidSecret) -> Self {
        Self::Format(err.into())
    }
}

impl From<TypeError> for WalletError {
    fn from(err: TypeError) -> Self {
        Self::Format(err.into())
    }
}

impl From<GatewayError> for WalletError {
    fn from(err: GatewayError) -> Self {
        Self::NetworkUnavailable(err)
    }
}

impl From<ConfigError> for WalletError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<ContextError> for WalletError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::NetworkUnavailable(inner) => Self::NetworkUnavailable(inner),
            other => Self::Configuration(other.to_string()),
        }
    }
}

impl From<AccountError> for WalletError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NetworkUnavailable(inner) => Self::NetworkUnavailable(inner),
            AccountError::NetworkMismatch {
                address_network,
                node_network,
                ..
            } => Self::Format(FormatError::WrongNetwork {
                address: address_network,
                expected: node_network,
            }),
            overflow @ AccountError::BalanceOverflow { .. } => {
                Self::Configuration(overflow.to_string())
            }
        }
    }
}

impl From<BuildError> for WalletError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::InvalidAddress(inner) => Self::Format(inner.into()),
            BuildError::Message(inner) => Self::Format(inner.into()),
            BuildError::RecipientNetworkMismatch { recipient, network } => {
                Self::Format(FormatError::WrongNetwork {
                    address: recipient,
                    expected: network,
                })
            }
            other @ (BuildError::FeeOverflow { .. } | BuildError::ClockBeforeEpoch) => {
                Self::Configuration(other.to_string())
            }
        }
    }
}

impl From<AnnounceError> for WalletError {
    fn from(err: AnnounceError) -> Self {
        match err {
            AnnounceError::RejectedByNode { status, body } => Self::RejectedByNode { status, body },
            AnnounceError::NetworkUnavailable(inner) => Self::NetworkUnavailable(inner),
        }
    }
}

impl From<ConfirmationError> for WalletError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::Timeout { hash, timeout } => {
                Self::ConfirmationTimeout { hash, timeout }
            }
            ConfirmationError::Rejected { hash, code } => Self::TransactionRejected { hash, code },
            ConfirmationError::Cancelled { hash } => Self::Cancelled { hash },
            ConfirmationError::NetworkUnavailable(inner) => Self::NetworkUnavailable(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_are_retryable() {
        let network: WalletError = GatewayError::Transport("refused".to_string()).into();
        assert!(network.is_retryable());

        let rejected: WalletError = AnnounceError::RejectedByNode {
            status: 409,
            body: "{}".to_string(),
        }
        .into();
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.class(), ErrorClass::RejectedByNode);

        let format: WalletError = AmountError::Empty.into();
        assert!(!format.is_retryable());
        assert_eq!(format.class(), ErrorClass::Format);
    }

    #[test]
    fn missing_currency_is_configuration() {
        let err: WalletError = ContextError::MissingCurrency.into();
        assert_eq!(err.class(), ErrorClass::Configuration);

        let err: WalletError =
            ContextError::NetworkUnavailable(GatewayError::ChannelClosed).into();
        assert_eq!(err.class(), ErrorClass::NetworkUnavailable);
    }

    #[test]
    fn recipient_on_other_network_is_a_format_error() {
        let err: WalletError = BuildError::RecipientNetworkMismatch {
            recipient: NetworkType::Mainnet,
            network: NetworkType::Testnet,
        }
        .into();
        assert_eq!(
            err,
            WalletError::Format(FormatError::WrongNetwork {
                address: NetworkType::Mainnet,
                expected: NetworkType::Testnet,
            })
        );
    }

    #[test]
    fn confirmation_outcomes_keep_their_identity() {
        let hash = TransactionHash([1; 32]);
        let err: WalletError = ConfirmationError::Rejected {
            hash,
            code: "Failure_Core_Insufficient_Balance".to_string(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::TransactionRejected);

        let err: WalletError = ConfirmationError::Timeout {
            hash,
            timeout: Duration::from_secs(1),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::ConfirmationTimeout);
    }
}
