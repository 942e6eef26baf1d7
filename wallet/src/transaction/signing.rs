//! Transaction signing with Ed25519 keypairs.
//!
//! The signed bytes are `generation_hash || payload[108..]`. Mixing the
//! generation hash in binds the signature to one network: the same payload
//! signed for testnet never verifies against the mainnet seed.
//!
//! The entity hash is computed from the signature actually produced, never
//! assumed. Ed25519 is deterministic anyway, so identical inputs give an
//! identical payload and hash.

use thiserror::Error;

use super::builder::TransferTransaction;
use super::payload::{self, BODY_OFFSET, SIGNATURE_OFFSET};
use super::types::{GenerationHash, TransactionHash};
use crate::config::NetworkType;
use crate::crypto::hash::sha3_256_parts;
use crate::crypto::keys::{PublicKey, Signature};
use crate::identity::address::Address;
use crate::identity::keypair::Keypair;

/// Raised when a keypair cannot sign a given transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("keypair is for {keypair}, transaction is for {transaction}")]
    NetworkMismatch {
        keypair: NetworkType,
        transaction: NetworkType,
    },
}

/// A transaction ready to announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    payload: Vec<u8>,
    hash: TransactionHash,
    signer: PublicKey,
    signer_address: Address,
    network: NetworkType,
}

impl SignedTransaction {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Upper-case hex of the payload, as the announce endpoint expects it.
    pub fn payload_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }

    pub fn hash(&self) -> TransactionHash {
        self.hash
    }

    pub fn signer(&self) -> &PublicKey {
        &self.signer
    }

    pub fn signer_address(&self) -> &Address {
        &self.signer_address
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }
}

/// Signed part of a payload. Empty when the payload stops before it.
fn signed_body(payload: &[u8]) -> &[u8] {
    payload.get(BODY_OFFSET..).unwrap_or(&[])
}

/// Bytes covered by the signature.
pub(crate) fn signing_bytes(payload: &[u8], generation_hash: &GenerationHash) -> Vec<u8> {
    let body = signed_body(payload);
    let mut data = Vec::with_capacity(32 + body.len());
    data.extend_from_slice(generation_hash.as_bytes());
    data.extend_from_slice(body);
    data
}

/// `SHA3-256(R || signer || generation_hash || body)`, where `R` is the first
/// half of the signature.
pub(crate) fn entity_hash(
    payload: &[u8],
    signature: &Signature,
    signer: &PublicKey,
    generation_hash: &GenerationHash,
) -> TransactionHash {
    TransactionHash(sha3_256_parts(&[
        &signature.as_bytes()[..32],
        signer.as_bytes(),
        generation_hash.as_bytes(),
        signed_body(payload),
    ]))
}

/// Signs `unsigned` with `keypair` for the network identified by
/// `generation_hash`.
///
/// Fails if the keypair was created for a different network than the
/// transaction declares.
pub fn sign(
    unsigned: &TransferTransaction,
    keypair: &Keypair,
    generation_hash: &GenerationHash,
) -> Result<SignedTransaction, SigningError> {
    if keypair.network() != unsigned.network {
        return Err(SigningError::NetworkMismatch {
            keypair: keypair.network(),
            transaction: unsigned.network,
        });
    }

    let signer = *keypair.public_key();
    let mut payload = payload::serialize_unsigned(unsigned, &signer);
    let signature = keypair.sign(&signing_bytes(&payload, generation_hash));
    payload::embed_signature(&mut payload, &signature);
    let hash = entity_hash(&payload, &signature, &signer, generation_hash);

    tracing::debug!(
        hash = %hash,
        signer = %keypair.address(),
        size = payload.len(),
        "signed transfer"
    );
    debug_assert_eq!(&payload[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 64], signature.as_bytes());

    Ok(SignedTransaction {
        payload,
        hash,
        signer,
        signer_address: *keypair.address(),
        network: unsigned.network,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::{Deadline, Message, Mosaic, MosaicId};

    fn unsigned(network: NetworkType) -> TransferTransaction {
        TransferTransaction {
            network,
            deadline: Deadline(1_000_000),
            recipient: *Keypair::generate(network).address(),
            mosaics: vec![Mosaic::new(MosaicId(0x72C0_212E_67A0_8BCE), 42)],
            message: Message::plain("memo").unwrap(),
            max_fee: 17_700,
        }
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Keypair::generate(NetworkType::Testnet);
        let tx = unsigned(NetworkType::Testnet);
        let gen = GenerationHash([0x11; 32]);

        let a = sign(&tx, &kp, &gen).unwrap();
        let b = sign(&tx, &kp, &gen).unwrap();
        assert_eq!(a.payload(), b.payload());
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_depends_on_generation_hash() {
        let kp = Keypair::generate(NetworkType::Testnet);
        let tx = unsigned(NetworkType::Testnet);
        let a = sign(&tx, &kp, &GenerationHash([0x11; 32])).unwrap();
        let b = sign(&tx, &kp, &GenerationHash([0x22; 32])).unwrap();
        assert_ne!(a.hash(), b.hash());
        // Body is identical; only the signature slot differs.
        assert_eq!(a.payload()[BODY_OFFSET..], b.payload()[BODY_OFFSET..]);
        assert_ne!(a.payload()[..BODY_OFFSET], b.payload()[..BODY_OFFSET]);
    }

    #[test]
    fn signature_covers_generation_hash_and_body() {
        let kp = Keypair::generate(NetworkType::Testnet);
        let gen = GenerationHash([0x33; 32]);
        let signed = sign(&unsigned(NetworkType::Testnet), &kp, &gen).unwrap();

        let signature = Signature::from_slice(&signed.payload()[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 64]).unwrap();
        let message = signing_bytes(signed.payload(), &gen);
        assert!(kp.public_key().verify(&message, &signature));
    }

    #[test]
    fn signer_metadata_is_recorded() {
        let kp = Keypair::generate(NetworkType::Testnet);
        let signed = sign(&unsigned(NetworkType::Testnet), &kp, &GenerationHash([0; 32])).unwrap();
        assert_eq!(signed.signer(), kp.public_key());
        assert_eq!(signed.signer_address(), kp.address());
        assert_eq!(signed.network(), NetworkType::Testnet);
        assert_eq!(signed.payload_hex().len(), signed.payload().len() * 2);
    }

    #[test]
    fn matches_published_transfer_vector() {
        let kp = Keypair::from_private_key_hex(
            "575DBB3062267EFF57C970A336EBBC8FBCFE12C5BD3ED7BC11EB0481D7704CED",
            NetworkType::Testnet,
        )
        .unwrap();
        let gen = GenerationHash::from_hex(
            "49D6E1CE276A85B70EAFE52349AACCA389302E7A9754BCF1221E79494FC665A4",
        )
        .unwrap();
        let tx = TransferTransaction {
            network: NetworkType::Testnet,
            deadline: Deadline(123_456_789),
            recipient: *kp.address(),
            mosaics: vec![Mosaic::new(MosaicId(0x72C0_212E_67A0_8BCE), 10_000_000)],
            message: Message::plain("hello").unwrap(),
            max_fee: 18_200,
        };

        let signed = sign(&tx, &kp, &gen).unwrap();
        assert_eq!(
            signed.payload_hex(),
            concat!(
                "B600000000000000", // size, reserved
                "297DA1BA64C69370D147760FBDB1EE07AF569F4D2627FE7E74F3B544C6601F45", // signature
                "20E6738C52C243DD9E77BA2B9D3CEFDF058EFD093974D41FCAF50870AE529B01",
                "2E834140FD66CF87B254A693A2C7862C819217B676D3943267156625E816EC6F", // signer
                "00000000", // reserved
                "01985441", // version, network, type
                "1847000000000000", // max fee
                "15CD5B0700000000", // deadline
                "9826D27E1D0A26CA4E316F901E23E55C8711DB20DFD26776", // recipient
                "0600010000000000", // message size, mosaic count, reserved
                "CE8BA0672E21C0728096980000000000", // mosaic
                "0068656C6C6F", // message
            )
        );
        assert_eq!(
            signed.hash().to_hex(),
            "87C5ED9706B88595F8CBBF1559EEFACA038264AAB55E4B44B5A8121C95DCAB1B"
        );
    }

    #[test]
    fn short_payload_has_empty_body() {
        let gen = GenerationHash([0x44; 32]);
        assert_eq!(signing_bytes(&[0u8; 40], &gen), gen.as_bytes().to_vec());

        let kp = Keypair::generate(NetworkType::Testnet);
        let signature = kp.sign(b"x");
        let short = entity_hash(&[0u8; 40], &signature, kp.public_key(), &gen);
        let bare = sha3_256_parts(&[&signature.as_bytes()[..32], kp.public_key().as_bytes(), gen.as_bytes()]);
        assert_eq!(short, TransactionHash(bare));
    }

    #[test]
    fn refuses_keypair_from_other_network() {
        let kp = Keypair::generate(NetworkType::Mainnet);
        let err = sign(&unsigned(NetworkType::Testnet), &kp, &GenerationHash([0; 32])).unwrap_err();
        assert_eq!(
            err,
            SigningError::NetworkMismatch {
                keypair: NetworkType::Mainnet,
                transaction: NetworkType::Testnet
            }
        );
    }
}
