//! Capability error taxonomy
//!
//! Every failure mode an external capability can surface to the router.
//! The engine converts these into step failures; they never escape the
//! run boundary as raw errors.

/// Errors surfaced by external capabilities
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The capability did not respond within its wall-clock budget
    #[error("capability timed out")]
    Timeout,

    /// The capability answered, but the payload could not be parsed
    #[error("malformed capability response: {0}")]
    Malformed(String),

    /// The capability is unreachable or rejected the call
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// A mutating call was attempted without a valid caller identity
    #[error("caller identity missing or rejected")]
    Unauthorized,
}

impl CapabilityError {
    /// Whether retrying the same call could plausibly succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = CapabilityError::Malformed("not json".to_string());
        assert!(err.to_string().contains("malformed"));
        assert!(CapabilityError::Unauthorized.to_string().contains("identity"));
    }

    #[test]
    fn retryable_classification() {
        assert!(CapabilityError::Timeout.is_retryable());
        assert!(CapabilityError::Unavailable("down".into()).is_retryable());
        assert!(!CapabilityError::Unauthorized.is_retryable());
        assert!(!CapabilityError::Malformed("x".into()).is_retryable());
    }
}
