//! # Protocol Constants & Client Configuration
//!
//! Every magic number the wallet relies on lives here: network identifiers,
//! currency divisibility, the transaction validity window, the binary layout
//! limits. If a constant is hardcoded somewhere else, move it here.
//!
//! The second half of the file is [`ClientConfig`], the runtime knobs a
//! caller picks (which node to talk to, how long to trust a cached network
//! snapshot, how long to wait for confirmation).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet network identifier byte. Addresses start with `N`.
pub const NETWORK_ID_MAINNET: u8 = 0x68;

/// Testnet network identifier byte. Addresses start with `T`.
pub const NETWORK_ID_TESTNET: u8 = 0x98;

/// The network a keypair, address or transaction belongs to.
///
/// The discriminant is the identifier byte that appears on the wire (first
/// byte of every address, byte 109 of every transaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

impl NetworkType {
    /// Maps a wire identifier to a network. `None` for anything we don't
    /// know how to address.
    pub fn from_identifier(id: u8) -> Option<Self> {
        match id {
            NETWORK_ID_MAINNET => Some(Self::Mainnet),
            NETWORK_ID_TESTNET => Some(Self::Testnet),
            _ => None,
        }
    }

    /// The identifier byte used on the wire.
    pub fn identifier(self) -> u8 {
        match self {
            Self::Mainnet => NETWORK_ID_MAINNET,
            Self::Testnet => NETWORK_ID_TESTNET,
        }
    }

    /// First character of every address on this network.
    pub fn address_prefix(self) -> char {
        match self {
            Self::Mainnet => 'N',
            Self::Testnet => 'T',
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for NetworkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Returns a friendly name for a raw network identifier, mainly for logging.
pub fn network_name(id: u8) -> String {
    match NetworkType::from_identifier(id) {
        Some(network) => network.to_string(),
        None => format!("unknown(0x{:02X})", id),
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Decimal places of the native currency. 1 XYM = 10^6 atomic units.
pub const CURRENCY_DIVISIBILITY: u32 = 6;

/// Atomic units per display unit.
pub const ATOMIC_UNITS_PER_DISPLAY_UNIT: u64 = 1_000_000;

/// Ticker used by the CLI when printing balances.
pub const CURRENCY_TICKER: &str = "XYM";

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Default validity window. Transactions not confirmed within two hours of
/// creation are dropped by the network.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(2 * 60 * 60);

/// Transfer transaction entity type on the wire.
pub const TRANSFER_TRANSACTION_TYPE: u16 = 0x4154;

/// Transfer transaction schema version.
pub const TRANSFER_TRANSACTION_VERSION: u8 = 1;

/// Maximum message size in bytes, including the one-byte type marker.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Length of an address in its 24-byte decoded form.
pub const ADDRESS_DECODED_LENGTH: usize = 24;

/// Length of an address in its base32 text form.
pub const ADDRESS_ENCODED_LENGTH: usize = 39;

/// Private keys are 32 bytes, 64 hex characters.
pub const PRIVATE_KEY_HEX_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Client Defaults
// ---------------------------------------------------------------------------

/// How long a fetched network snapshot is trusted before it is re-fetched.
pub const DEFAULT_CONTEXT_TTL: Duration = Duration::from_secs(10 * 60);

/// How long `await_confirmation` waits before giving up.
/// Blocks land every ~30s, so five minutes is ten blocks of slack.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Public testnet node used when nothing else is configured.
pub const DEFAULT_NODE_URL: &str = "http://sym-test-01.opening-line.jp:3000";

// ---------------------------------------------------------------------------
// Client Configuration
// ---------------------------------------------------------------------------

/// Errors raised while validating a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid node url '{url}': {reason}")]
    InvalidNodeUrl { url: String, reason: String },

    #[error("unknown network '{0}' (expected mainnet or testnet)")]
    UnknownNetwork(String),

    #[error("unknown fee strategy '{0}'")]
    UnknownFeeStrategy(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Which of the node's reported fee multipliers is used as the fee cap rate.
///
/// The node reports several statistics over recent blocks. `Average` is the
/// usual choice: it confirms in reasonable time without overpaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStrategy {
    #[default]
    Average,
    Median,
    Highest,
    Lowest,
    Minimum,
}

impl FromStr for FeeStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" => Ok(Self::Average),
            "median" => Ok(Self::Median),
            "highest" => Ok(Self::Highest),
            "lowest" => Ok(Self::Lowest),
            "minimum" | "min" => Ok(Self::Minimum),
            other => Err(ConfigError::UnknownFeeStrategy(other.to_string())),
        }
    }
}

/// Runtime configuration for [`crate::client::WalletClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST endpoint of the node, e.g. `http://localhost:3000`.
    pub node_url: String,
    /// Explicit push-channel endpoint. Derived from `node_url` when `None`.
    pub websocket_url: Option<String>,
    /// Network new accounts are generated on.
    pub network: NetworkType,
    /// Staleness bound for the cached network snapshot.
    pub context_ttl: Duration,
    /// Default deadline for confirmation waits.
    pub confirmation_timeout: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Fee multiplier selection.
    pub fee_strategy: FeeStrategy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            websocket_url: None,
            network: NetworkType::Testnet,
            context_ttl: DEFAULT_CONTEXT_TTL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fee_strategy: FeeStrategy::Average,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `node_url` with every other knob defaulted.
    pub fn for_node(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Self::default()
        }
    }

    /// Checks that the URLs parse and that no duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let node = url::Url::parse(&self.node_url).map_err(|e| ConfigError::InvalidNodeUrl {
            url: self.node_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(node.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidNodeUrl {
                url: self.node_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if let Some(ws) = &self.websocket_url {
            url::Url::parse(ws).map_err(|e| ConfigError::InvalidNodeUrl {
                url: ws.clone(),
                reason: e.to_string(),
            })?;
        }
        if self.context_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "context_ttl" });
        }
        if self.confirmation_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "confirmation_timeout",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "request_timeout",
            });
        }
        Ok(())
    }

    /// The push-channel endpoint: the explicit one if set, otherwise the node
    /// URL with `http` swapped for `ws` and `/ws` appended.
    pub fn websocket_endpoint(&self) -> String {
        if let Some(ws) = &self.websocket_url {
            return ws.clone();
        }
        let base = self.node_url.trim_end_matches('/');
        let swapped = if let Some(rest) = base.strip_prefix("https") {
            format!("wss{}", rest)
        } else if let Some(rest) = base.strip_prefix("http") {
            format!("ws{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws", swapped)
    }
}
