//! Testing utilities for the Waypoint workspace
//!
//! Scripted capability doubles and router fixtures shared by integration
//! tests.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use waypoint_capability::{
    AuthToken, CapabilityError, LanguageModel, LocationLookup, LocationRecord, MemorySideEffects,
    RuleBasedLanguageModel, SideEffectPort, StaticLocationLookup,
};
use waypoint_core::agents::default_registry;
use waypoint_core::{Router, RouterConfig};
use waypoint_store::ConversationStore;

/// Language model that replays scripted results.
///
/// `extract` pops from a queue of scripted results (oldest first); once the
/// queue is drained it answers `Malformed`. `complete` always returns the
/// fixed reply.
pub struct ScriptedModel {
    reply: String,
    extractions: Mutex<VecDeque<Result<Value, CapabilityError>>>,
}

impl ScriptedModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            extractions: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a successful extraction result
    #[must_use]
    pub fn extracting(self, value: Value) -> Self {
        self.push(Ok(value))
    }

    /// Queue a failing extraction result
    #[must_use]
    pub fn failing(self, error: CapabilityError) -> Self {
        self.push(Err(error))
    }

    fn push(self, result: Result<Value, CapabilityError>) -> Self {
        self.extractions.lock().unwrap().push_back(result);
        self
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _prompt: &str, _history: &[String]) -> Result<String, CapabilityError> {
        Ok(self.reply.clone())
    }

    async fn extract(&self, _prompt: &str, _schema: &Value) -> Result<Value, CapabilityError> {
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CapabilityError::Malformed("script exhausted".to_string())))
    }
}

/// Lookup double that never finds anything
pub struct EmptyLookup;

#[async_trait::async_trait]
impl LocationLookup for EmptyLookup {
    async fn find_by_category(
        &self,
        _category: &str,
        _region: Option<&str>,
    ) -> Result<Option<LocationRecord>, CapabilityError> {
        Ok(None)
    }
}

/// Lookup double whose backend is down
pub struct BrokenLookup;

#[async_trait::async_trait]
impl LocationLookup for BrokenLookup {
    async fn find_by_category(
        &self,
        _category: &str,
        _region: Option<&str>,
    ) -> Result<Option<LocationRecord>, CapabilityError> {
        Err(CapabilityError::Unavailable("lookup backend down".to_string()))
    }
}

/// Caller identity for tests
pub fn test_auth() -> AuthToken {
    AuthToken::new("tester")
}

/// A classification payload naming `kinds` in order, as the plan compiler's
/// extraction schema expects it
pub fn classification(kinds: &[&str]) -> Value {
    json!({ "tasks": kinds })
}

/// Router over the built-in rule-based capabilities and the sample
/// location data, with a fresh in-memory store
pub fn rule_router() -> Router {
    rule_router_with_effects().0
}

/// Same as [`rule_router`], also handing back the side-effect recorder so
/// tests can assert on what was (or was not) performed
pub fn rule_router_with_effects() -> (Router, Arc<MemorySideEffects>) {
    let effects = Arc::new(MemorySideEffects::new());
    let model: Arc<dyn LanguageModel> = Arc::new(RuleBasedLanguageModel::new());
    let registry = default_registry(
        Arc::clone(&model),
        Arc::new(StaticLocationLookup::haman_sample()),
        Arc::clone(&effects) as Arc<dyn SideEffectPort>,
    );
    let router = Router::new(
        RouterConfig::new(),
        model,
        registry,
        Arc::new(ConversationStore::new()),
    );
    (router, effects)
}

/// Router wired from explicit capability doubles
pub fn router_with(
    model: Arc<dyn LanguageModel>,
    lookup: Arc<dyn LocationLookup>,
    effects: Arc<dyn SideEffectPort>,
) -> Router {
    let registry = default_registry(Arc::clone(&model), lookup, effects);
    Router::new(
        RouterConfig::new(),
        model,
        registry,
        Arc::new(ConversationStore::new()),
    )
}
