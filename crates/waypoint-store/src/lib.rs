//! Conversation state store
//!
//! Append-only per-session message history with immutable snapshots:
//! - A snapshot is taken once per routing invocation and never changes
//!   afterwards, no matter what is appended to the session later.
//! - Appends to one session are serialized; different sessions never contend.
//! - Snapshots are bounded to the most recent N turns (policy knob,
//!   default 20).

#![warn(unreachable_pub)]

pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::ConversationStore;
pub use types::{ConversationSnapshot, Role, SessionId, Turn};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
