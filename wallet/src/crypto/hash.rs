//! Hash functions used by the address and transaction formats.
//!
//! The network fixes both choices: SHA3-256 (Keccak with the NIST padding,
//! not the pre-standard variant) for entity hashes, and RIPEMD-160 of
//! SHA3-256 for the 20-byte account digest inside an address.

use ripemd::Ripemd160;
use sha3::{Digest, Sha3_256};

/// SHA3-256 of `data`.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// SHA3-256 over several slices, without concatenating them first.
pub fn sha3_256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// `RIPEMD160(SHA3-256(public_key))`. This is the account digest embedded in
/// every address.
pub fn address_digest(public_key: &[u8; 32]) -> [u8; 20] {
    let inner = sha3_256(public_key);
    let mut hasher = Ripemd160::new();
    hasher.update(inner);
    let mut output = [0u8; 20];
    output.copy_from_slice(&hasher.finalize());
    output
}
