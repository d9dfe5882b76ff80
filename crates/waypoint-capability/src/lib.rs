//! Capability contracts consumed by the Waypoint router core.
//!
//! The router never talks to an LLM provider, a location database, or the
//! community-board API directly. It consumes three opaque capabilities:
//! - [`LanguageModel`]: free-form completion plus structured extraction
//! - [`LocationLookup`]: read-only civic-data queries by category/region
//! - [`SideEffectPort`]: authenticated externally-visible mutations
//!
//! The [`rule`] module provides deterministic, dependency-free
//! implementations (keyword classifier, static location table, in-memory
//! side-effect recorder) used by the CLI and the test suites.

#![warn(unreachable_pub)]

pub mod effect;
pub mod error;
pub mod language;
pub mod lookup;
pub mod rule;

pub use effect::{AuthToken, Confirmation, SideEffectPort};
pub use error::CapabilityError;
pub use language::LanguageModel;
pub use lookup::{LocationLookup, LocationRecord};
pub use rule::{MemorySideEffects, RuleBasedLanguageModel, StaticLocationLookup};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
