//! Error types for the router core
//!
//! Split by phase:
//! - `PlanError`: work-plan invariant violations (compiler bugs, not user
//!   input problems)
//! - `CompileError`: the one hard compiler failure (empty utterance) -
//!   classification problems degrade to a Converse fallback instead
//! - `AgentError`: what an agent invocation can surface to the engine; the
//!   engine converts every variant into a step failure value
//! - `RouterError`: faults of a whole routing invocation that cannot be
//!   answered with a response (store outage, empty input)

use waypoint_capability::CapabilityError;
use waypoint_store::StoreError;

/// Work-plan invariant violations
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A plan must contain at least one task
    #[error("work plan is empty")]
    Empty,

    /// Sequence indices must be `0..n` with no gaps
    #[error("non-contiguous sequence index: expected {expected}, found {found}")]
    NonContiguous {
        /// Index the validator expected at this position
        expected: usize,
        /// Index the task actually carried
        found: usize,
    },
}

/// Hard compiler failures.
///
/// Deliberately small: classification-capability errors and unknown kinds are
/// absorbed by the Converse fallback so a turn never dead-ends on them.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The utterance was empty after trimming
    #[error("utterance is empty")]
    EmptyUtterance,

    /// Internal invariant violation while assembling the plan
    #[error("plan construction failed: {0}")]
    Plan(#[from] PlanError),
}

/// Failures an agent invocation can surface to the engine
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A lookup found nothing for the query
    #[error("nothing found for: {0}")]
    NotFound(String),

    /// A required input was missing (auth token, shared fact)
    #[error("missing required input: {0}")]
    Precondition(String),

    /// The backing capability failed
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Faults of a whole routing invocation
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Plan compilation failed hard
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The conversation store was unavailable
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_from_plan_error() {
        let err = CompileError::from(PlanError::Empty);
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn agent_error_wraps_capability() {
        let err = AgentError::from(CapabilityError::Timeout);
        assert!(err.to_string().contains("timed out"));
    }
}
