//! # Cryptographic Primitives
//!
//! Everything the wallet signs or hashes goes through here:
//!
//! - **Ed25519** (RFC 8032, SHA-512) for account keys and transaction
//!   signatures, via `ed25519-dalek`.
//! - **SHA3-256** for transaction hashes and address checksums.
//! - **RIPEMD-160** over SHA3-256 for address derivation.
//!
//! Thin, typed wrappers only. Nothing here implements a primitive itself.

pub mod hash;
pub mod keys;

pub use hash::{address_digest, sha3_256};
pub use keys::{KeyError, PrivateKey, PublicKey, Signature};
