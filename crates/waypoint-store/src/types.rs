//! Conversation value types
//!
//! Turns and the immutable snapshot handed to the plan compiler and the
//! execution engine. A snapshot is a point-in-time copy; later appends to the
//! store never reach a snapshot that has already been produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session identifier (one per conversing user)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw session key
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The conversing user
    User,
    /// The assistant's final response for a turn
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message in a session's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author role
    pub role: Role,
    /// Message text
    pub text: String,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time
    #[inline]
    #[must_use]
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Convenience constructor for a user turn
    #[inline]
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(Role::User, text)
    }

    /// Convenience constructor for an assistant turn
    #[inline]
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::now(Role::Assistant, text)
    }
}

/// Immutable, chronologically ordered view of a session's recent history.
///
/// Created per routing invocation and discarded when the run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    session: SessionId,
    turns: Vec<Turn>,
}

impl ConversationSnapshot {
    /// Build a snapshot from already-ordered turns
    #[inline]
    #[must_use]
    pub fn new(session: SessionId, turns: Vec<Turn>) -> Self {
        Self { session, turns }
    }

    /// Empty snapshot (first turn of a session)
    #[inline]
    #[must_use]
    pub fn empty(session: SessionId) -> Self {
        Self::new(session, Vec::new())
    }

    /// Session this snapshot belongs to
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Turns, oldest first
    #[inline]
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns in the snapshot
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the snapshot holds no turns
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render turns as `role: text` lines for a language-model call
    #[must_use]
    pub fn render_lines(&self) -> Vec<String> {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect()
    }
}
