//! Store error types

/// Errors surfaced by the conversation store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A session lock could not be acquired within budget, even after retry
    #[error("store unavailable for session {session}")]
    Unavailable {
        /// Session whose log could not be locked
        session: String,
    },
}
