//! # Identity Module
//!
//! Who signs and who receives. Every account is an Ed25519 keypair; its
//! address is a checksummed, network-tagged digest of the public key.
//!
//! 1. **Address**: 24 bytes on the wire, 39 base32 characters on screen.
//!    The first character tells the network apart (`T` testnet, `N`
//!    mainnet).
//! 2. **Keypair**: private key, public key and derived address for one
//!    network. Signing a transaction for another network is refused.

pub mod address;
pub mod keypair;

pub use address::{Address, AddressError};
pub use keypair::{InvalidSecret, Keypair};
