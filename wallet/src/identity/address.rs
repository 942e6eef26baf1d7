//! # Account Addresses
//!
//! An address is 24 bytes derived from a public key and a network:
//!
//! ```text
//! public_key (32 bytes)
//!     -> RIPEMD160(SHA3-256(public_key))          20 bytes
//!     -> network_byte || digest                    21 bytes
//!     -> || SHA3-256(network_byte || digest)[..3]  24 bytes
//!     -> base32 (RFC 4648, no padding)             39 chars
//! ```
//!
//! The network byte lands in the top five bits of the first character,
//! which is why every testnet address starts with `T` and every mainnet
//! address with `N`. The three checksum bytes catch typos before a transfer
//! ever reaches the node.
//!
//! Parsing is forgiving about presentation (lower case, surrounding
//! whitespace, the hyphenated `TABCDE-FGHIJK-...` form) and strict about
//! content (length, alphabet, network byte, checksum).

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{NetworkType, ADDRESS_DECODED_LENGTH, ADDRESS_ENCODED_LENGTH};
use crate::crypto::hash::{address_digest, sha3_256};
use crate::crypto::keys::PublicKey;

const CHECKSUM_LENGTH: usize = 3;
const VERSIONED_DIGEST_LENGTH: usize = ADDRESS_DECODED_LENGTH - CHECKSUM_LENGTH;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons an address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be {expected} characters, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("address contains characters outside the base32 alphabet")]
    InvalidEncoding,

    #[error("address network byte 0x{0:02X} is not a known network")]
    UnknownNetwork(u8),

    #[error("address prefix '{got}' does not match network {network} (expected '{expected}')")]
    PrefixMismatch {
        network: NetworkType,
        expected: char,
        got: char,
    },

    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A validated account address.
///
/// Construction always goes through derivation or checked decoding, so a
/// value of this type is known to carry a valid network byte and checksum.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    bytes: [u8; ADDRESS_DECODED_LENGTH],
}

impl Address {
    /// Derives the address of `public_key` on `network`.
    pub fn from_public_key(public_key: &PublicKey, network: NetworkType) -> Self {
        let digest = address_digest(public_key.as_bytes());

        let mut bytes = [0u8; ADDRESS_DECODED_LENGTH];
        bytes[0] = network.identifier();
        bytes[1..VERSIONED_DIGEST_LENGTH].copy_from_slice(&digest);

        let checksum = sha3_256(&bytes[..VERSIONED_DIGEST_LENGTH]);
        bytes[VERSIONED_DIGEST_LENGTH..].copy_from_slice(&checksum[..CHECKSUM_LENGTH]);

        Self { bytes }
    }

    /// Validates the 24-byte wire form (network byte and checksum).
    pub fn from_bytes(bytes: [u8; ADDRESS_DECODED_LENGTH]) -> Result<Self, AddressError> {
        NetworkType::from_identifier(bytes[0]).ok_or(AddressError::UnknownNetwork(bytes[0]))?;

        let checksum = sha3_256(&bytes[..VERSIONED_DIGEST_LENGTH]);
        if checksum[..CHECKSUM_LENGTH] != bytes[VERSIONED_DIGEST_LENGTH..] {
            return Err(AddressError::ChecksumMismatch);
        }
        Ok(Self { bytes })
    }

    /// Parses the text form. Accepts lower case, surrounding whitespace and
    /// hyphen separators.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let got = normalized.chars().count();
        if got != ADDRESS_ENCODED_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_ENCODED_LENGTH,
                got,
            });
        }

        let decoded = BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map_err(|_| AddressError::InvalidEncoding)?;
        let bytes: [u8; ADDRESS_DECODED_LENGTH] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidEncoding)?;

        let network =
            NetworkType::from_identifier(bytes[0]).ok_or(AddressError::UnknownNetwork(bytes[0]))?;
        let first = normalized.chars().next().unwrap_or_default();
        if first != network.address_prefix() {
            return Err(AddressError::PrefixMismatch {
                network,
                expected: network.address_prefix(),
                got: first,
            });
        }

        Self::from_bytes(bytes)
    }

    pub fn network(&self) -> NetworkType {
        // from_bytes already rejected unknown identifiers.
        NetworkType::from_identifier(self.bytes[0]).unwrap_or(NetworkType::Testnet)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_DECODED_LENGTH] {
        &self.bytes
    }

    /// The 39-character base32 form.
    pub fn encoded(&self) -> String {
        BASE32_NOPAD.encode(&self.bytes)
    }

    /// Hyphenated form for display: `TABCDE-FGHIJK-...-XYZ`.
    pub fn pretty(&self) -> String {
        let encoded = self.encoded();
        encoded
            .as_bytes()
            .chunks(6)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encoded())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKey;

    fn sample(network: NetworkType) -> Address {
        let key = PrivateKey::from_bytes(&[7u8; 32]);
        Address::from_public_key(&key.public_key(), network)
    }

    // Published account vector for the network's key and address derivation.
    const VECTOR_PRIVATE_KEY: &str = "575DBB3062267EFF57C970A336EBBC8FBCFE12C5BD3ED7BC11EB0481D7704CED";
    const VECTOR_PUBLIC_KEY: &str = "2E834140FD66CF87B254A693A2C7862C819217B676D3943267156625E816EC6F";

    #[test]
    fn derives_published_addresses() {
        let public_key = PrivateKey::from_hex(VECTOR_PRIVATE_KEY).unwrap().public_key();
        assert_eq!(public_key.to_hex(), VECTOR_PUBLIC_KEY);

        let testnet = Address::from_public_key(&public_key, NetworkType::Testnet);
        let mainnet = Address::from_public_key(&public_key, NetworkType::Mainnet);
        assert_eq!(testnet.encoded(), "TATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA37JGO5Q");
        assert_eq!(mainnet.encoded(), "NATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA34SQ33Y");
        assert_eq!(
            Address::parse("TATNE7-Q5BITM-UTRRN6-IB4I7F-LSDRDW-ZA37JG-O5Q").unwrap(),
            testnet
        );
    }

    #[test]
    fn encoded_form_has_fixed_length_and_prefix() {
        let testnet = sample(NetworkType::Testnet).encoded();
        let mainnet = sample(NetworkType::Mainnet).encoded();
        assert_eq!(testnet.len(), ADDRESS_ENCODED_LENGTH);
        assert_eq!(mainnet.len(), ADDRESS_ENCODED_LENGTH);
        assert!(testnet.starts_with('T'));
        assert!(mainnet.starts_with('N'));
    }

    #[test]
    fn parse_roundtrip() {
        let addr = sample(NetworkType::Testnet);
        let parsed = Address::parse(&addr.encoded()).unwrap();
        assert_eq!(addr, parsed);
        assert_eq!(parsed.network(), NetworkType::Testnet);
    }

    #[test]
    fn parse_accepts_pretty_and_lowercase_forms() {
        let addr = sample(NetworkType::Testnet);
        assert_eq!(Address::parse(&addr.pretty()).unwrap(), addr);
        assert_eq!(Address::parse(&addr.encoded().to_lowercase()).unwrap(), addr);
        assert_eq!(
            Address::parse(&format!("  {}\n", addr.encoded())).unwrap(),
            addr
        );
    }

    #[test]
    fn pretty_form_groups_by_six() {
        let pretty = sample(NetworkType::Testnet).pretty();
        let groups: Vec<&str> = pretty.split('-').collect();
        assert_eq!(groups.len(), 7);
        assert!(groups[..6].iter().all(|g| g.len() == 6));
        assert_eq!(groups[6].len(), 3);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            Address::parse("TABC"),
            Err(AddressError::InvalidLength {
                expected: 39,
                got: 4
            })
        );
    }

    #[test]
    fn parse_rejects_non_base32_characters() {
        let mut text = sample(NetworkType::Testnet).encoded();
        text.replace_range(5..6, "1");
        assert_eq!(Address::parse(&text), Err(AddressError::InvalidEncoding));
    }

    #[test]
    fn parse_detects_corrupted_checksum() {
        let addr = sample(NetworkType::Testnet);
        let mut bytes = *addr.as_bytes();
        bytes[10] ^= 0x01;
        let corrupted = BASE32_NOPAD.encode(&bytes);
        assert_eq!(
            Address::parse(&corrupted),
            Err(AddressError::ChecksumMismatch)
        );
    }

    #[test]
    fn from_bytes_rejects_unknown_network() {
        let mut bytes = *sample(NetworkType::Testnet).as_bytes();
        bytes[0] = 0x01;
        assert_eq!(
            Address::from_bytes(bytes),
            Err(AddressError::UnknownNetwork(0x01))
        );
    }

    #[test]
    fn serde_uses_text_form() {
        let addr = sample(NetworkType::Mainnet);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.encoded()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn same_key_differs_across_networks() {
        let testnet = sample(NetworkType::Testnet);
        let mainnet = sample(NetworkType::Mainnet);
        assert_ne!(testnet, mainnet);
        // Same key digest, different network byte and checksum.
        assert_eq!(testnet.as_bytes()[1..21], mainnet.as_bytes()[1..21]);
        assert_eq!(mainnet.network(), NetworkType::Mainnet);
    }
}
