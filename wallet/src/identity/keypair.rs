//! Account keypairs bound to a network.
//!
//! A [`Keypair`] is a private key plus the network it was created for. The
//! address is derived once at construction and carried along, since every
//! signing and balance call needs it.

use std::fmt;
use thiserror::Error;

use crate::config::NetworkType;
use crate::crypto::keys::{KeyError, PrivateKey, PublicKey, Signature};
use crate::identity::address::Address;

/// Raised when a supplied secret is not a valid private key encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid secret: {0}")]
pub struct InvalidSecret(#[from] pub KeyError);

/// Ed25519 key material for one account on one network.
///
/// Owned by the caller; the library never persists it.
#[derive(Clone)]
pub struct Keypair {
    private_key: PrivateKey,
    public_key: PublicKey,
    network: NetworkType,
    address: Address,
}

impl Keypair {
    /// Fresh keypair from the OS RNG.
    pub fn generate(network: NetworkType) -> Self {
        Self::from_private_key(PrivateKey::generate(), network)
    }

    /// Rebuilds a keypair from its 64-character hex secret.
    pub fn from_private_key_hex(secret: &str, network: NetworkType) -> Result<Self, InvalidSecret> {
        let private_key = PrivateKey::from_hex(secret.trim())?;
        Ok(Self::from_private_key(private_key, network))
    }

    pub fn from_private_key(private_key: PrivateKey, network: NetworkType) -> Self {
        let public_key = private_key.public_key();
        let address = Address::from_public_key(&public_key, network);
        Self {
            private_key,
            public_key,
            network,
            address,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Upper-case hex of the secret. Only the "create account" flow should
    /// need this, to show a new secret to its owner once.
    pub fn private_key_hex(&self) -> String {
        self.private_key.to_hex()
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        self.private_key.sign(message)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
