//! Cryptographic verification of signed transfers.
//!
//! Verification is always against an explicit generation hash. A payload
//! signed for one network fails here for any other network's seed, which is
//! the replay protection the signing scheme exists for.

use thiserror::Error;

use super::payload::{parse_transfer, ParsedTransfer, PayloadError};
use super::signing::{entity_hash, signing_bytes, SignedTransaction};
use super::types::GenerationHash;

/// Reasons a signed transaction failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("malformed payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("embedded signer does not match the recorded signer")]
    SignerMismatch,

    #[error("signature does not verify for generation hash {0}")]
    BadSignature(GenerationHash),

    #[error("recorded hash does not match the payload")]
    HashMismatch,
}

/// Parses `payload` and checks its signature against `generation_hash`.
pub fn verify_payload(
    payload: &[u8],
    generation_hash: &GenerationHash,
) -> Result<ParsedTransfer, VerificationError> {
    let parsed = parse_transfer(payload)?;
    let message = signing_bytes(payload, generation_hash);
    if !parsed.signer.verify(&message, &parsed.signature) {
        return Err(VerificationError::BadSignature(*generation_hash));
    }
    Ok(parsed)
}

/// Full check of a [`SignedTransaction`]: payload structure, signature and
/// the recorded entity hash.
pub fn verify_signed(
    signed: &SignedTransaction,
    generation_hash: &GenerationHash,
) -> Result<ParsedTransfer, VerificationError> {
    let parsed = verify_payload(signed.payload(), generation_hash)?;
    if parsed.signer != *signed.signer() {
        return Err(VerificationError::SignerMismatch);
    }
    let hash = entity_hash(signed.payload(), &parsed.signature, &parsed.signer, generation_hash);
    if hash != signed.hash() {
        return Err(VerificationError::HashMismatch);
    }
    Ok(parsed)
}
