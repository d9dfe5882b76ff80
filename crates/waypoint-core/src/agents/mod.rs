//! Built-in agents
//!
//! One agent per task kind, each a thin adapter from the engine's
//! [`Agent`](crate::registry::Agent) seam onto the external capabilities:
//! - [`ConverseAgent`]: general conversation over the session history
//! - [`LookupFactAgent`]: civic-data queries, publishes `location` facts
//! - [`ComposePostAgent`]: writes a community-board post (mutating)
//! - [`ComposeMissionAgent`]: assigns a resettlement mission (mutating)

mod compose_mission;
mod compose_post;
mod converse;
mod lookup;

pub use compose_mission::ComposeMissionAgent;
pub use compose_post::ComposePostAgent;
pub use converse::ConverseAgent;
pub use lookup::LookupFactAgent;

use crate::registry::{AgentRegistry, AgentTraits};
use crate::types::TaskKind;
use std::sync::Arc;
use waypoint_capability::{LanguageModel, LocationLookup, SideEffectPort};

/// Build the standard registry: all four kinds, with the conversational and
/// lookup agents read-only and the composing agents mutating. Failures halt
/// the plan by default; callers wanting best-effort kinds register their own
/// traits.
#[must_use]
pub fn default_registry(
    model: Arc<dyn LanguageModel>,
    lookup: Arc<dyn LocationLookup>,
    effects: Arc<dyn SideEffectPort>,
) -> AgentRegistry {
    AgentRegistry::new()
        .register(
            TaskKind::Converse,
            AgentTraits::read_only(),
            Arc::new(ConverseAgent::new(Arc::clone(&model))),
        )
        .register(
            TaskKind::LookupFact,
            AgentTraits::read_only(),
            Arc::new(LookupFactAgent::new(lookup)),
        )
        .register(
            TaskKind::ComposePost,
            AgentTraits::mutating(),
            Arc::new(ComposePostAgent::new(Arc::clone(&model), Arc::clone(&effects))),
        )
        .register(
            TaskKind::ComposeMission,
            AgentTraits::mutating(),
            Arc::new(ComposeMissionAgent::new(model, effects)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_capability::{MemorySideEffects, RuleBasedLanguageModel, StaticLocationLookup};

    #[test]
    fn default_registry_covers_all_kinds() {
        let registry = default_registry(
            Arc::new(RuleBasedLanguageModel::new()),
            Arc::new(StaticLocationLookup::haman_sample()),
            Arc::new(MemorySideEffects::new()),
        );

        for kind in TaskKind::ALL {
            assert!(registry.contains(kind), "missing agent for {kind}");
        }

        assert!(registry.resolve(TaskKind::ComposePost).unwrap().traits.mutating);
        assert!(!registry.resolve(TaskKind::Converse).unwrap().traits.mutating);
        assert!(!registry.resolve(TaskKind::LookupFact).unwrap().traits.best_effort);
    }
}
