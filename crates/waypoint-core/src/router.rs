//! Router facade
//!
//! The entry point for one conversational turn:
//! 1. Snapshot the session history
//! 2. Compile the utterance into a work plan
//! 3. Execute the plan
//! 4. Persist the user turn and the assistant's final response
//!
//! One router instance serves many sessions concurrently; each call owns its
//! snapshot, plan and execution context, so concurrent turns for different
//! sessions never share state.

use crate::compiler::PlanCompiler;
use crate::config::RouterConfig;
use crate::engine::{CancelFlag, ExecutionEngine};
use crate::error::RouterError;
use crate::registry::AgentRegistry;
use crate::types::FinalResponse;
use std::sync::Arc;
use waypoint_capability::{AuthToken, LanguageModel};
use waypoint_store::{ConversationStore, SessionId, Turn};

/// Conversational task router
#[derive(Debug)]
pub struct Router {
    store: Arc<ConversationStore>,
    compiler: PlanCompiler,
    engine: ExecutionEngine,
    history_window: usize,
}

impl Router {
    /// Wire a router from its parts.
    ///
    /// The registry is frozen here; there is no re-registration during a run.
    #[must_use]
    pub fn new(
        config: RouterConfig,
        model: Arc<dyn LanguageModel>,
        registry: AgentRegistry,
        store: Arc<ConversationStore>,
    ) -> Self {
        let registry = Arc::new(registry);
        let history_window = config.history_window;
        Self {
            store,
            compiler: PlanCompiler::new(model, Arc::clone(&registry), config.clone()),
            engine: ExecutionEngine::new(registry, config),
            history_window,
        }
    }

    /// Handle one user turn.
    ///
    /// # Errors
    /// - `RouterError::Compile` when the utterance is blank
    /// - `RouterError::Store` when the conversation store is unavailable
    pub async fn respond(
        &self,
        session: &SessionId,
        utterance: &str,
        auth: Option<&AuthToken>,
    ) -> Result<FinalResponse, RouterError> {
        self.respond_with_cancel(session, utterance, auth, &CancelFlag::new())
            .await
    }

    /// Handle one user turn, honoring a transport-owned cancellation flag.
    ///
    /// # Errors
    /// Same as [`Router::respond`].
    pub async fn respond_with_cancel(
        &self,
        session: &SessionId,
        utterance: &str,
        auth: Option<&AuthToken>,
        cancel: &CancelFlag,
    ) -> Result<FinalResponse, RouterError> {
        tracing::info!(%session, "handling turn");

        let snapshot = self
            .store
            .snapshot_windowed(session, self.history_window)
            .await?;
        let plan = self
            .compiler
            .compile_with_caller(utterance, &snapshot, auth)
            .await?;

        tracing::info!(plan_id = %plan.id(), kinds = ?plan.kinds(), "plan compiled");

        let response = self.engine.run_with_cancel(&plan, &snapshot, cancel).await;

        self.store.append(session, Turn::user(utterance.trim())).await?;
        self.store
            .append(session, Turn::assistant(response.text.clone()))
            .await?;

        Ok(response)
    }

    /// The store this router persists turns into
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::default_registry;
    use crate::error::CompileError;
    use waypoint_capability::{MemorySideEffects, RuleBasedLanguageModel, StaticLocationLookup};

    fn rule_router() -> Router {
        let model: Arc<dyn LanguageModel> = Arc::new(RuleBasedLanguageModel::new());
        let registry = default_registry(
            Arc::clone(&model),
            Arc::new(StaticLocationLookup::haman_sample()),
            Arc::new(MemorySideEffects::new()),
        );
        Router::new(
            RouterConfig::new(),
            model,
            registry,
            Arc::new(ConversationStore::new()),
        )
    }

    #[tokio::test]
    async fn blank_utterance_is_a_hard_error() {
        let router = rule_router();
        let result = router.respond(&SessionId::new("s1"), "  ", None).await;
        assert!(matches!(
            result,
            Err(RouterError::Compile(CompileError::EmptyUtterance))
        ));
    }

    #[tokio::test]
    async fn turns_are_persisted_after_a_run() {
        let router = rule_router();
        let session = SessionId::new("s1");

        let response = router.respond(&session, "안녕하세요", None).await.unwrap();
        assert!(!response.text.is_empty());

        let snapshot = router.store().snapshot(&session).await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.turns()[0].text, "안녕하세요");
        assert_eq!(snapshot.turns()[1].text, response.text);
    }

    #[tokio::test]
    async fn second_turn_sees_the_first_in_history() {
        let router = rule_router();
        let session = SessionId::new("s1");

        router.respond(&session, "안녕하세요", None).await.unwrap();
        let response = router.respond(&session, "고마워요", None).await.unwrap();

        // The converse agent greets returning users differently.
        assert!(response.text.starts_with("말씀 감사해요."));
    }
}
