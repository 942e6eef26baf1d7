//! # Lifecycle Module
//!
//! What happens to a signed transaction after it leaves the wallet.
//!
//! ```text
//! announcer.rs      single submission, node acceptance only
//! confirmation.rs   subscription + lookup race, timeout, cancellation
//! ```

pub mod announcer;
pub mod confirmation;

pub use announcer::{AnnounceError, AnnouncementReceipt, Announcer};
pub use confirmation::{
    ConfirmationError, ConfirmationHandle, ConfirmationState, ConfirmationWaiter, WaitPhase,
};
