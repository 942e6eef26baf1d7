//! # Network Module
//!
//! Everything that talks to a node.
//!
//! ## Architecture
//!
//! ```text
//! gateway.rs   NodeGateway / Subscription traits, DTOs, ChannelEvent
//! context.rs   NetworkContext, gated fetch, TTL cache
//! http.rs      REST (reqwest) + push channel (tokio-tungstenite)
//! mock.rs      in-memory gateway with failure and event injection
//!              (`test-util` feature)
//! ```
//!
//! ## Notes
//!
//! - The library never reaches for a global node handle. The gateway is an
//!   `Arc<dyn NodeGateway>` passed in by the owner, and the context cache is
//!   owned next to it.
//! - The mock state sits behind `parking_lot::Mutex`; no lock is held across
//!   an await. The context cache uses `tokio::sync::Mutex` because it must
//!   hold its slot across the fetch.

pub mod context;
pub mod gateway;
pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use context::{fetch_network_context, ContextError, NetworkContext, NetworkContextCache};
pub use gateway::{
    AccountInfo, AnnounceResponse, ChannelEvent, ConfirmedTransaction, FeeMultipliers,
    GatewayError, NodeGateway, Subscription,
};
pub use http::HttpGateway;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockGateway;
