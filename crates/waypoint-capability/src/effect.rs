//! Side-effect capability
//!
//! Externally-visible mutations (board posts, mission assignments). Every
//! call carries an explicit caller identity; anonymous mutation is rejected
//! at the capability boundary.

use crate::error::CapabilityError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller identity for mutating calls.
///
/// `Debug` is redacted so tokens never reach logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw bearer token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Access the raw token for the outbound call
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is non-empty
    #[inline]
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Confirmation record for a performed side effect.
///
/// The `id` is the persisted side-effect identifier the engine attaches to
/// mutating step results so a caller can detect "already done" before a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Persisted side-effect identifier
    pub id: String,
    /// Action that was performed ("create_post", "create_mission")
    pub action: String,
    /// Human-readable summary ("post #42 created")
    pub summary: String,
}

/// Opaque mutating capability
#[async_trait::async_trait]
pub trait SideEffectPort: Send + Sync {
    /// Perform `action` with `payload` on behalf of `auth`.
    ///
    /// # Errors
    /// - [`CapabilityError::Unauthorized`] when the identity is missing/invalid
    /// - [`CapabilityError::Unavailable`] when the backing service fails
    async fn perform(
        &self,
        action: &str,
        payload: &Value,
        auth: &AuthToken,
    ) -> Result<Confirmation, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new("secret-bearer");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn auth_token_presence() {
        assert!(AuthToken::new("abc").is_present());
        assert!(!AuthToken::new("   ").is_present());
        assert!(!AuthToken::new("").is_present());
    }
}
