//! Agent registry
//!
//! Maps each task kind to an executable agent plus its declared traits
//! (mutating, best-effort). Registration happens once at process start;
//! the registry is read-only at run time, so no locking is needed.

use crate::error::AgentError;
use crate::types::{AgentInput, AgentOutput, TaskKind};
use std::collections::HashMap;
use std::sync::Arc;

/// An executable unit resolved by task kind
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Execute one task.
    ///
    /// Agents receive a read-only view (payload, earlier facts, history
    /// snapshot) and return either an output or an [`AgentError`]; the
    /// engine converts both into step results.
    async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError>;
}

/// Declared side-effect traits of a registered agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentTraits {
    /// Whether the agent performs externally-visible mutations.
    /// Mutating agents are not idempotent; retries must check side-effect
    /// ids before re-running them.
    pub mutating: bool,
    /// Whether a failure of this agent lets the plan continue
    pub best_effort: bool,
}

impl AgentTraits {
    /// Read-only, plan-halting on failure
    #[inline]
    #[must_use]
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Mutating, plan-halting on failure
    #[inline]
    #[must_use]
    pub fn mutating() -> Self {
        Self {
            mutating: true,
            best_effort: false,
        }
    }

    /// Mark as best-effort
    #[inline]
    #[must_use]
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

/// One registry entry
#[derive(Clone)]
pub struct RegisteredAgent {
    /// The executable unit
    pub handle: Arc<dyn Agent>,
    /// Declared traits
    pub traits: AgentTraits,
}

impl std::fmt::Debug for RegisteredAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAgent")
            .field("traits", &self.traits)
            .finish_non_exhaustive()
    }
}

/// Static kind-to-agent table
#[derive(Debug, Default)]
pub struct AgentRegistry {
    entries: HashMap<TaskKind, RegisteredAgent>,
}

impl AgentRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent for a kind (replaces any previous registration)
    #[must_use]
    pub fn register(
        mut self,
        kind: TaskKind,
        traits: AgentTraits,
        handle: Arc<dyn Agent>,
    ) -> Self {
        self.entries.insert(kind, RegisteredAgent { handle, traits });
        self
    }

    /// Resolve a kind to its registered agent
    #[inline]
    #[must_use]
    pub fn resolve(&self, kind: TaskKind) -> Option<&RegisteredAgent> {
        self.entries.get(&kind)
    }

    /// Whether a kind is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: TaskKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Registered kinds (unordered)
    #[must_use]
    pub fn kinds(&self) -> Vec<TaskKind> {
        self.entries.keys().copied().collect()
    }

    /// Number of registered agents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
