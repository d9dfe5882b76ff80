//! Waypoint Core - conversational task router and agent execution engine
//!
//! One user utterance becomes an ordered work plan; the plan's tasks run
//! strictly in sequence through registered agents, threading shared facts
//! forward; the step results aggregate into one user-facing response which
//! is persisted back to the session history.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waypoint_core::prelude::*;
//! use waypoint_capability::{MemorySideEffects, RuleBasedLanguageModel, StaticLocationLookup};
//! use waypoint_store::{ConversationStore, SessionId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model: Arc<dyn waypoint_capability::LanguageModel> =
//!     Arc::new(RuleBasedLanguageModel::new());
//! let registry = waypoint_core::agents::default_registry(
//!     Arc::clone(&model),
//!     Arc::new(StaticLocationLookup::haman_sample()),
//!     Arc::new(MemorySideEffects::new()),
//! );
//! let router = Router::new(
//!     RouterConfig::new(),
//!     model,
//!     registry,
//!     Arc::new(ConversationStore::new()),
//! );
//!
//! let response = router
//!     .respond(&SessionId::new("local"), "카페 찾아줘", None)
//!     .await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod agents;
pub mod aggregate;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod router;
pub mod types;

// Re-exports for convenience
pub use aggregate::aggregate;
pub use compiler::PlanCompiler;
pub use config::RouterConfig;
pub use engine::{CancelFlag, ExecutionEngine};
pub use error::{AgentError, CompileError, PlanError, RouterError};
pub use registry::{Agent, AgentRegistry, AgentTraits, RegisteredAgent};
pub use router::Router;
pub use types::{
    AgentInput, AgentOutput, ExecutionContext, FailureReason, FinalResponse, Outcome, Payload,
    PlanId, SharedFacts, StepResult, Task, TaskId, TaskKind, WorkPlan,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the Waypoint router
    pub use crate::{
        Agent, AgentRegistry, AgentTraits, CancelFlag, ExecutionEngine, FinalResponse, Outcome,
        PlanCompiler, Router, RouterConfig, StepResult, Task, TaskKind, WorkPlan,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
