//! Value types shared by the builder, the binary codec and the gateway.
//!
//! Everything here is small and `Copy` where the wire form is fixed-width.
//! Text forms are upper-case hex, which is what nodes print and accept.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::amount::AtomicAmount;
use crate::config::MAX_MESSAGE_SIZE;

/// Errors raised while decoding the text form of a value type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid mosaic id '{0}': expected up to 16 hex digits")]
    InvalidMosaicId(String),

    #[error("invalid hash '{0}': expected 64 hex characters")]
    InvalidHash(String),

    #[error("message is {size} bytes encoded (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

// ---------------------------------------------------------------------------
// MosaicId
// ---------------------------------------------------------------------------

/// Identifier of a mosaic (asset). The native currency is one of them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MosaicId(pub u64);

impl MosaicId {
    /// Parses `"72C0212E67A08BCE"`, `"0x72C0'212E'67A0'8BCE"` and friends.
    ///
    /// Nodes print network properties with a `0x` prefix and `'` digit
    /// separators; account endpoints print bare hex.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        let digits: String = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed)
            .chars()
            .filter(|c| *c != '\'')
            .collect();
        if digits.is_empty() || digits.len() > 16 {
            return Err(TypeError::InvalidMosaicId(raw.to_string()));
        }
        u64::from_str_radix(&digits, 16)
            .map(Self)
            .map_err(|_| TypeError::InvalidMosaicId(raw.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Display for MosaicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MosaicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MosaicId({})", self.to_hex())
    }
}

impl FromStr for MosaicId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MosaicId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MosaicId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An amount of one mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mosaic {
    pub id: MosaicId,
    pub amount: AtomicAmount,
}

impl Mosaic {
    pub fn new(id: MosaicId, amount: AtomicAmount) -> Self {
        Self { id, amount }
    }
}

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// Expiry of a transaction, in milliseconds since the network epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Deadline(pub u64);

impl Deadline {
    /// `now + window`, expressed relative to the network epoch.
    ///
    /// `None` if the clock reads earlier than the epoch or the sum overflows.
    pub fn from_unix_millis(now_ms: u64, epoch_adjustment_secs: u64, window: Duration) -> Option<Self> {
        let epoch_ms = epoch_adjustment_secs.checked_mul(1000)?;
        let since_epoch = now_ms.checked_sub(epoch_ms)?;
        let window_ms = u64::try_from(window.as_millis()).ok()?;
        since_epoch.checked_add(window_ms).map(Self)
    }

    /// Wall-clock time of the deadline in Unix milliseconds.
    pub fn to_unix_millis(self, epoch_adjustment_secs: u64) -> u64 {
        self.0.saturating_add(epoch_adjustment_secs.saturating_mul(1000))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Type marker of an unencrypted message.
pub const PLAIN_MESSAGE_MARKER: u8 = 0x00;

/// Transfer message in its encoded form.
///
/// An empty message encodes to zero bytes. Anything else is the plain marker
/// followed by the UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    encoded: Vec<u8>,
}

impl Message {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn plain(text: &str) -> Result<Self, TypeError> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        let size = text.len() + 1;
        if size > MAX_MESSAGE_SIZE {
            return Err(TypeError::MessageTooLarge {
                size,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut encoded = Vec::with_capacity(size);
        encoded.push(PLAIN_MESSAGE_MARKER);
        encoded.extend_from_slice(text.as_bytes());
        Ok(Self { encoded })
    }

    /// Wraps bytes read off the wire without interpreting them.
    pub(crate) fn from_encoded(encoded: Vec<u8>) -> Self {
        Self { encoded }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    /// The text of a plain message. `None` for other message types or
    /// invalid UTF-8; `Some("")` for the empty message.
    pub fn text(&self) -> Option<&str> {
        match self.encoded.split_first() {
            None => Some(""),
            Some((&PLAIN_MESSAGE_MARKER, body)) => std::str::from_utf8(body).ok(),
            Some(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// 32-byte digests
// ---------------------------------------------------------------------------

fn decode_hash32(raw: &str) -> Result<[u8; 32], TypeError> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(raw.trim(), &mut bytes).map_err(|_| TypeError::InvalidHash(raw.to_string()))?;
    Ok(bytes)
}

/// Network generation hash seed. Mixed into every signature, so a transaction
/// signed for one network never verifies on another.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationHash(pub [u8; 32]);

impl GenerationHash {
    pub fn from_hex(raw: &str) -> Result<Self, TypeError> {
        decode_hash32(raw).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for GenerationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for GenerationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenerationHash({})", self.to_hex())
    }
}

/// Entity hash of a signed transaction. This is the id nodes index it by.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub [u8; 32]);

impl TransactionHash {
    pub fn from_hex(raw: &str) -> Result<Self, TypeError> {
        decode_hash32(raw).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionHash({})", self.to_hex())
    }
}

impl FromStr for TransactionHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for TransactionHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TransactionHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
