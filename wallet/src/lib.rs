// Copyright (c) 2026 The symbol-wallet Authors. MIT License.
// See LICENSE for details.

//! # Symbol Wallet Core
//!
//! Transaction lifecycle engine for a Symbol (XYM) wallet: everything between
//! "the user typed an amount" and "the network confirmed it", with no UI.
//!
//! ## Architecture
//!
//! - **amount**: display/atomic conversion. Integer only.
//! - **config**: network identifiers, protocol constants, `ClientConfig`.
//! - **crypto**: Ed25519 keys, SHA3-256 and RIPEMD-160 digests.
//! - **identity**: addresses and network-bound keypairs.
//! - **transaction**: builder, canonical binary layout, signing, verification.
//! - **network**: the node gateway contract, its HTTP/WebSocket and
//!   in-memory implementations, and the network context cache.
//! - **account**: key generation and balance queries.
//! - **lifecycle**: announcement and confirmation tracking.
//! - **client**: the caller-facing facade tying it all together.
//! - **error**: the error taxonomy callers branch on.
//!
//! ## Ground Rules
//!
//! 1. Amounts are `u64` atomic units everywhere except at the string edge.
//! 2. Every signature commits to the network's generation hash.
//! 3. Network state is passed explicitly; there is no global node handle.
//! 4. Every subscription that is opened is closed, whatever the outcome.

pub mod account;
pub mod amount;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod network;
pub mod transaction;

pub use amount::{to_atomic, to_display, AmountError, AtomicAmount};
pub use client::{SentTransfer, WalletClient};
pub use config::{ClientConfig, FeeStrategy, NetworkType};
pub use error::{ErrorClass, FormatError, WalletError};
pub use identity::{Address, Keypair};
pub use lifecycle::{ConfirmationState, WaitPhase};
pub use transaction::{SignedTransaction, TransactionHash};
