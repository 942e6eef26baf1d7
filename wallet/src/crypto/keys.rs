//! # Key Material
//!
//! Ed25519 private keys, public keys and signatures.
//!
//! A private key is the 32-byte RFC 8032 seed; the public key is derived
//! from it with SHA-512 as usual. Signatures are deterministic, so the same
//! key and message always give the same 64 bytes. The transaction hash
//! relies on that: re-signing an identical transaction reproduces the same
//! hash.
//!
//! ## Security considerations
//!
//! - Key generation uses `OsRng`.
//! - Secret bytes are zeroized on drop by ed25519-dalek.
//! - `PrivateKey` implements neither `Serialize` nor a revealing `Debug`.
//!   Exporting the secret is an explicit call to [`PrivateKey::to_hex`].

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::PRIVATE_KEY_HEX_LENGTH;

/// Errors that can occur while decoding key material.
///
/// Deliberately terse: error messages never echo the offending secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid private key: expected 64 hex characters")]
    InvalidPrivateKey,

    #[error("invalid public key: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature: expected 64 bytes")]
    InvalidSignature,
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// An Ed25519 signing key.
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Key from the raw 32-byte seed.
    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Key from its 64-character hex encoding (either case).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        if hex_str.len() != PRIVATE_KEY_HEX_LENGTH {
            return Err(KeyError::InvalidPrivateKey);
        }
        let mut seed = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut seed).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_bytes(&seed))
    }

    /// Upper-case hex of the seed, the format wallets display and import.
    ///
    /// **Handle with care.** This is the only thing standing between an
    /// attacker and the account.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Deterministic Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self::from_bytes(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(pub={})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of an account key. Embedded in every signed transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    /// Validates that the bytes decode to a curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.bytes)
    }

    /// Returns `true` only for a valid signature by this key over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; 64],
}

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 64] = slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032 section 7.1, TEST 1.
    const RFC_SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const RFC_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn derives_rfc8032_public_key() {
        let key = PrivateKey::from_hex(RFC_SECRET).unwrap();
        assert_eq!(key.public_key().to_hex(), RFC_PUBLIC.to_uppercase());
    }

    #[test]
    fn hex_roundtrip_is_case_insensitive() {
        let key = PrivateKey::from_hex(&RFC_SECRET.to_uppercase()).unwrap();
        assert_eq!(key.to_hex(), RFC_SECRET.to_uppercase());
    }

    #[test]
    fn rejects_malformed_private_keys() {
        assert_eq!(
            PrivateKey::from_hex("abcd").unwrap_err(),
            KeyError::InvalidPrivateKey
        );
        let not_hex = "zz".repeat(32);
        assert_eq!(
            PrivateKey::from_hex(&not_hex).unwrap_err(),
            KeyError::InvalidPrivateKey
        );
        let too_long = format!("{}00", RFC_SECRET);
        assert!(PrivateKey::from_hex(&too_long).is_err());
    }

    #[test]
    fn sign_and_verify() {
        let key = PrivateKey::generate();
        let sig = key.sign(b"transfer 10 XYM");
        assert!(key.public_key().verify(b"transfer 10 XYM", &sig));
        assert!(!key.public_key().verify(b"transfer 11 XYM", &sig));
    }

    #[test]
    fn signatures_are_deterministic() {
        let key = PrivateKey::generate();
        assert_eq!(key.sign(b"same"), key.sign(b"same"));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let sig = a.sign(b"msg");
        assert!(!b.public_key().verify(b"msg", &sig));
    }

    #[test]
    fn debug_never_prints_the_secret() {
        let key = PrivateKey::from_hex(RFC_SECRET).unwrap();
        let dbg = format!("{:?}", key);
        assert!(!dbg.to_lowercase().contains(RFC_SECRET));
        assert!(dbg.contains(&RFC_PUBLIC.to_uppercase()));
    }

    #[test]
    fn signature_from_slice_checks_length() {
        assert!(Signature::from_slice(&[0u8; 63]).is_err());
        assert!(Signature::from_slice(&[0u8; 64]).is_ok());
    }
}
