//! # Transaction Module
//!
//! Construction, binary encoding, signing and verification of transfer
//! transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs         value types (MosaicId, Deadline, Message, hashes)
//! builder.rs       TransferTransactionBuilder, unsigned TransferTransaction
//! payload.rs       canonical little-endian layout, parse_transfer
//! signing.rs       sign(), SignedTransaction, entity hash
//! verification.rs  signature and hash checks against a generation hash
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: [`TransferTransactionBuilder`] against a network context.
//! 2. **Sign**: [`sign`] with the sender's keypair and generation hash.
//! 3. **Announce**: [`crate::lifecycle::announcer`].
//! 4. **Confirm**: [`crate::lifecycle::confirmation`].
//!
//! All amounts are `u64` atomic units. The max fee is the fee multiplier
//! times the real serialized size, never an estimate.

pub mod builder;
pub mod payload;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{BuildError, TransferTransaction, TransferTransactionBuilder};
pub use payload::{parse_transfer, ParsedTransfer, PayloadError};
pub use signing::{sign, SignedTransaction, SigningError};
pub use types::{Deadline, GenerationHash, Message, Mosaic, MosaicId, TransactionHash, TypeError};
pub use verification::{verify_payload, verify_signed, VerificationError};
