//! Canonical binary layout of a transfer transaction.
//!
//! All integers are little-endian. Offsets:
//!
//! ```text
//!   0   4  size             108  1  version        152  2  message size
//!   4   4  reserved         109  1  network        154  1  mosaic count
//!   8  64  signature        110  2  entity type    155  5  reserved
//!  72  32  signer key       112  8  max fee        160 16k mosaics (id, amount)
//! 104   4  reserved         120  8  deadline        ..  m  message
//!                           128 24  recipient
//! ```
//!
//! Bytes `[108..]` are the signed body. The signature slot is zeroed while
//! the body is serialized and filled in by [`super::signing`].

use thiserror::Error;

use super::builder::TransferTransaction;
use super::types::{Deadline, Message, Mosaic, MosaicId};
use crate::config::{
    NetworkType, ADDRESS_DECODED_LENGTH, MAX_MESSAGE_SIZE, TRANSFER_TRANSACTION_TYPE,
    TRANSFER_TRANSACTION_VERSION,
};
use crate::crypto::keys::{PublicKey, Signature};
use crate::identity::address::{Address, AddressError};

pub const SIZE_OFFSET: usize = 0;
pub const SIGNATURE_OFFSET: usize = 8;
pub const SIGNER_OFFSET: usize = 72;
/// Start of the signed body.
pub const BODY_OFFSET: usize = 108;
const NETWORK_OFFSET: usize = 109;
const TYPE_OFFSET: usize = 110;
const MAX_FEE_OFFSET: usize = 112;
const DEADLINE_OFFSET: usize = 120;
const RECIPIENT_OFFSET: usize = 128;
const MESSAGE_SIZE_OFFSET: usize = 152;
const MOSAIC_COUNT_OFFSET: usize = 154;

/// Fixed part of a transfer, up to the first mosaic.
pub const TRANSFER_HEADER_SIZE: usize = 160;
/// One `(id, amount)` pair.
pub const MOSAIC_SIZE: usize = 16;

/// Reasons a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload truncated: need {needed} bytes, have {got}")]
    Truncated { needed: usize, got: usize },

    #[error("declared size {declared} does not match payload length {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("entity type 0x{0:04X} is not a transfer")]
    NotATransfer(u16),

    #[error("unsupported transfer version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown network identifier 0x{0:02X}")]
    UnknownNetwork(u8),

    #[error("invalid signer public key")]
    InvalidSigner,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(#[from] AddressError),

    #[error("mosaics are not sorted by id")]
    UnsortedMosaics,

    #[error("message of {0} bytes exceeds the limit")]
    MessageTooLarge(usize),
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serializes `tx` with `signer` embedded and a zeroed signature slot.
pub fn serialize_unsigned(tx: &TransferTransaction, signer: &PublicKey) -> Vec<u8> {
    let size = tx.size();
    let mut buf = Vec::with_capacity(size);

    buf.extend_from_slice(&(size as u32).to_le_bytes());
    buf.extend_from_slice(&[0u8; 4]);
    buf.extend_from_slice(&[0u8; 64]);
    buf.extend_from_slice(signer.as_bytes());
    buf.extend_from_slice(&[0u8; 4]);

    buf.push(TRANSFER_TRANSACTION_VERSION);
    buf.push(tx.network.identifier());
    buf.extend_from_slice(&TRANSFER_TRANSACTION_TYPE.to_le_bytes());
    buf.extend_from_slice(&tx.max_fee.to_le_bytes());
    buf.extend_from_slice(&tx.deadline.0.to_le_bytes());

    buf.extend_from_slice(tx.recipient.as_bytes());
    buf.extend_from_slice(&(tx.message.len() as u16).to_le_bytes());
    buf.push(tx.mosaics.len() as u8);
    buf.extend_from_slice(&[0u8; 5]);

    for mosaic in &tx.mosaics {
        buf.extend_from_slice(&mosaic.id.0.to_le_bytes());
        buf.extend_from_slice(&mosaic.amount.to_le_bytes());
    }
    buf.extend_from_slice(tx.message.as_bytes());

    debug_assert_eq!(buf.len(), size);
    buf
}

/// Writes `signature` into the signature slot of a serialized payload.
pub(crate) fn embed_signature(payload: &mut [u8], signature: &Signature) {
    payload[SIGNATURE_OFFSET..SIGNER_OFFSET].copy_from_slice(signature.as_bytes());
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A transfer decoded from its binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransfer {
    pub size: usize,
    pub signature: Signature,
    pub signer: PublicKey,
    pub network: NetworkType,
    pub max_fee: u64,
    pub deadline: Deadline,
    pub recipient: Address,
    pub mosaics: Vec<Mosaic>,
    pub message: Message,
}

impl ParsedTransfer {
    /// Amount of `id` carried by the transfer, 0 if absent.
    pub fn amount_of(&self, id: MosaicId) -> u64 {
        self.mosaics
            .iter()
            .filter(|m| m.id == id)
            .map(|m| m.amount)
            .fold(0, u64::saturating_add)
    }

    /// Text of a plain message, `None` otherwise.
    pub fn message_text(&self) -> Option<&str> {
        self.message.text()
    }
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

/// Decodes a signed (or unsigned) transfer payload.
///
/// Checks the declared size, entity type, version, network, recipient
/// checksum and mosaic ordering. Does not verify the signature; see
/// [`super::verification`].
pub fn parse_transfer(payload: &[u8]) -> Result<ParsedTransfer, PayloadError> {
    if payload.len() < TRANSFER_HEADER_SIZE {
        return Err(PayloadError::Truncated {
            needed: TRANSFER_HEADER_SIZE,
            got: payload.len(),
        });
    }

    let declared = read_u32(payload, SIZE_OFFSET) as usize;
    if declared != payload.len() {
        return Err(PayloadError::SizeMismatch {
            declared,
            actual: payload.len(),
        });
    }

    let entity_type = read_u16(payload, TYPE_OFFSET);
    if entity_type != TRANSFER_TRANSACTION_TYPE {
        return Err(PayloadError::NotATransfer(entity_type));
    }
    let version = payload[BODY_OFFSET];
    if version != TRANSFER_TRANSACTION_VERSION {
        return Err(PayloadError::UnsupportedVersion(version));
    }
    let network_id = payload[NETWORK_OFFSET];
    let network =
        NetworkType::from_identifier(network_id).ok_or(PayloadError::UnknownNetwork(network_id))?;

    let mut signer_bytes = [0u8; 32];
    signer_bytes.copy_from_slice(&payload[SIGNER_OFFSET..BODY_OFFSET - 4]);
    let signer = PublicKey::from_bytes(signer_bytes).map_err(|_| PayloadError::InvalidSigner)?;
    let signature = Signature::from_slice(&payload[SIGNATURE_OFFSET..SIGNER_OFFSET])
        .map_err(|_| PayloadError::InvalidSigner)?;

    let mut recipient_bytes = [0u8; ADDRESS_DECODED_LENGTH];
    recipient_bytes
        .copy_from_slice(&payload[RECIPIENT_OFFSET..RECIPIENT_OFFSET + ADDRESS_DECODED_LENGTH]);
    let recipient = Address::from_bytes(recipient_bytes)?;

    let message_len = read_u16(payload, MESSAGE_SIZE_OFFSET) as usize;
    if message_len > MAX_MESSAGE_SIZE {
        return Err(PayloadError::MessageTooLarge(message_len));
    }
    let mosaic_count = payload[MOSAIC_COUNT_OFFSET] as usize;

    let needed = TRANSFER_HEADER_SIZE + MOSAIC_SIZE * mosaic_count + message_len;
    if needed != payload.len() {
        return Err(if needed > payload.len() {
            PayloadError::Truncated {
                needed,
                got: payload.len(),
            }
        } else {
            PayloadError::SizeMismatch {
                declared: needed,
                actual: payload.len(),
            }
        });
    }

    let mosaics: Vec<Mosaic> = (0..mosaic_count)
        .map(|i| {
            let at = TRANSFER_HEADER_SIZE + i * MOSAIC_SIZE;
            Mosaic::new(MosaicId(read_u64(payload, at)), read_u64(payload, at + 8))
        })
        .collect();
    if mosaics.windows(2).any(|pair| pair[0].id > pair[1].id) {
        return Err(PayloadError::UnsortedMosaics);
    }

    let message_start = TRANSFER_HEADER_SIZE + MOSAIC_SIZE * mosaic_count;
    let message = Message::from_encoded(payload[message_start..].to_vec());

    Ok(ParsedTransfer {
        size: declared,
        signature,
        signer,
        network,
        max_fee: read_u64(payload, MAX_FEE_OFFSET),
        deadline: Deadline(read_u64(payload, DEADLINE_OFFSET)),
        recipient,
        mosaics,
        message,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
