//! Work plan compiler
//!
//! Turns one user utterance plus the conversation snapshot into an ordered
//! work plan. Classification runs through the language-model capability;
//! every way that call can go wrong (transport error, malformed output,
//! unknown kind names, empty list) degrades to a single-task Converse plan.
//! The conversation never dead-ends on a classification error.

use crate::config::RouterConfig;
use crate::error::CompileError;
use crate::registry::AgentRegistry;
use crate::types::{Payload, TaskKind, WorkPlan};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use waypoint_capability::{AuthToken, LanguageModel};
use waypoint_store::ConversationSnapshot;

const CLASSIFY_PROMPT: &str = "You are the request router for a rural-resettlement assistant. \
Classify the user's request into an ordered list of task kinds, in the order the user implied. \
Valid kinds: Converse, LookupFact, ComposePost, ComposeMission. \
Return an empty list when none apply.";

/// Compiles utterances into work plans
pub struct PlanCompiler {
    model: Arc<dyn LanguageModel>,
    registry: Arc<AgentRegistry>,
    config: RouterConfig,
}

impl PlanCompiler {
    /// Create a compiler over a classification model and the agent registry
    #[inline]
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<AgentRegistry>,
        config: RouterConfig,
    ) -> Self {
        Self {
            model,
            registry,
            config,
        }
    }

    /// Compile a plan with no caller identity (read-only task kinds only
    /// will be able to act; mutating agents will refuse without a token).
    ///
    /// # Errors
    /// `CompileError::EmptyUtterance` when the utterance is blank.
    pub async fn compile(
        &self,
        utterance: &str,
        history: &ConversationSnapshot,
    ) -> Result<WorkPlan, CompileError> {
        self.compile_with_caller(utterance, history, None).await
    }

    /// Compile a plan, stamping the caller's identity into the payloads of
    /// mutating task kinds.
    ///
    /// Pure apart from the external classification capability: same inputs,
    /// same plan shape.
    ///
    /// # Errors
    /// `CompileError::EmptyUtterance` when the utterance is blank.
    pub async fn compile_with_caller(
        &self,
        utterance: &str,
        history: &ConversationSnapshot,
        auth: Option<&AuthToken>,
    ) -> Result<WorkPlan, CompileError> {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(CompileError::EmptyUtterance);
        }

        let kinds = self.classify(trimmed, history).await;
        tracing::debug!(?kinds, "compiled work plan kinds");

        let steps: Vec<(TaskKind, Payload)> = kinds
            .into_iter()
            .map(|kind| {
                let mut payload = Payload::new();
                payload.insert("utterance".to_string(), json!(trimmed));
                if let Some(region) = &self.config.default_region {
                    payload.insert("region".to_string(), json!(region));
                }
                let mutating = self
                    .registry
                    .resolve(kind)
                    .map(|entry| entry.traits.mutating)
                    .unwrap_or(false);
                if mutating {
                    if let Some(token) = auth {
                        payload.insert("auth_token".to_string(), json!(token.expose()));
                    }
                }
                (kind, payload)
            })
            .collect();

        Ok(WorkPlan::from_steps(steps)?)
    }

    /// Classify the utterance into registered task kinds, degrading to
    /// `[Converse]` on any classification problem.
    async fn classify(&self, utterance: &str, history: &ConversationSnapshot) -> Vec<TaskKind> {
        let schema = json!({
            "type": "object",
            "properties": {
                "tasks": { "type": "array", "items": { "type": "string" } }
            }
        });

        let prompt = Self::build_prompt(utterance, history);

        let value = match self.model.extract(&prompt, &schema).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "classification failed, falling back to Converse");
                return vec![TaskKind::Converse];
            }
        };

        let Some(names) = value.get("tasks").and_then(Value::as_array) else {
            tracing::warn!("classifier output missing tasks list, falling back to Converse");
            return vec![TaskKind::Converse];
        };

        let mut kinds = Vec::new();
        for name in names.iter().filter_map(Value::as_str) {
            match TaskKind::from_str(name) {
                Ok(kind) if self.registry.contains(kind) => kinds.push(kind),
                Ok(kind) => {
                    tracing::warn!(%kind, "classifier named an unregistered kind, dropping task");
                }
                Err(unknown) => {
                    tracing::warn!(%unknown, "classifier named an unknown kind, dropping task");
                }
            }
        }

        if kinds.is_empty() {
            tracing::debug!("no routable kinds classified, falling back to Converse");
            kinds.push(TaskKind::Converse);
        }
        kinds
    }

    fn build_prompt(utterance: &str, history: &ConversationSnapshot) -> String {
        let mut prompt = String::from(CLASSIFY_PROMPT);
        if !history.is_empty() {
            prompt.push_str("\n\n[대화 기록]");
            for line in history.render_lines() {
                prompt.push('\n');
                prompt.push_str(&line);
            }
        }
        prompt.push_str("\n\n사용자: ");
        prompt.push_str(utterance);
        prompt
    }
}

impl std::fmt::Debug for PlanCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCompiler")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::registry::{Agent, AgentTraits};
    use crate::types::{payload_str, AgentInput, AgentOutput};
    use waypoint_capability::{CapabilityError, RuleBasedLanguageModel};
    use waypoint_store::SessionId;

    struct NoopAgent;

    #[async_trait::async_trait]
    impl Agent for NoopAgent {
        async fn invoke(&self, _input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::text("ok"))
        }
    }

    fn full_registry() -> Arc<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        for kind in TaskKind::ALL {
            let traits = match kind {
                TaskKind::ComposePost | TaskKind::ComposeMission => AgentTraits::mutating(),
                _ => AgentTraits::read_only(),
            };
            registry = registry.register(kind, traits, Arc::new(NoopAgent));
        }
        Arc::new(registry)
    }

    fn rule_compiler(registry: Arc<AgentRegistry>) -> PlanCompiler {
        PlanCompiler::new(
            Arc::new(RuleBasedLanguageModel::new()),
            registry,
            RouterConfig::new(),
        )
    }

    /// Model that always answers with a fixed extraction result
    struct FixedModel(Result<Value, fn() -> CapabilityError>);

    #[async_trait::async_trait]
    impl waypoint_capability::LanguageModel for FixedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _history: &[String],
        ) -> Result<String, CapabilityError> {
            Ok(String::new())
        }

        async fn extract(
            &self,
            _prompt: &str,
            _schema: &Value,
        ) -> Result<Value, CapabilityError> {
            match &self.0 {
                Ok(value) => Ok(value.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn empty_history() -> ConversationSnapshot {
        ConversationSnapshot::empty(SessionId::new("s1"))
    }

    #[tokio::test]
    async fn empty_utterance_is_rejected() {
        let compiler = rule_compiler(full_registry());
        let result = compiler.compile("   ", &empty_history()).await;
        assert!(matches!(result, Err(CompileError::EmptyUtterance)));
    }

    #[tokio::test]
    async fn unmatched_utterance_falls_back_to_converse() {
        let compiler = rule_compiler(full_registry());
        let plan = compiler
            .compile("오늘 날씨 어때?", &empty_history())
            .await
            .unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::Converse]);
    }

    #[tokio::test]
    async fn multi_step_order_follows_utterance() {
        let compiler = rule_compiler(full_registry());
        let plan = compiler
            .compile("카페 찾아서 게시글 써줘", &empty_history())
            .await
            .unwrap();
        assert_eq!(
            plan.kinds(),
            vec![TaskKind::LookupFact, TaskKind::ComposePost]
        );
    }

    #[tokio::test]
    async fn unknown_kind_names_are_dropped() {
        let model = FixedModel(Ok(json!({ "tasks": ["GeneratePostAgent", "LookupFact"] })));
        let compiler = PlanCompiler::new(Arc::new(model), full_registry(), RouterConfig::new());

        let plan = compiler.compile("뭐든지", &empty_history()).await.unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::LookupFact]);
    }

    #[tokio::test]
    async fn all_unknown_kinds_fall_back_to_converse() {
        let model = FixedModel(Ok(json!({ "tasks": ["WeatherAgent"] })));
        let compiler = PlanCompiler::new(Arc::new(model), full_registry(), RouterConfig::new());

        let plan = compiler.compile("뭐든지", &empty_history()).await.unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::Converse]);
    }

    #[tokio::test]
    async fn classifier_error_falls_back_to_converse() {
        let model = FixedModel(Err(|| CapabilityError::Timeout));
        let compiler = PlanCompiler::new(Arc::new(model), full_registry(), RouterConfig::new());

        let plan = compiler.compile("아무 말", &empty_history()).await.unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::Converse]);
    }

    #[tokio::test]
    async fn malformed_classifier_output_falls_back() {
        let model = FixedModel(Ok(json!({ "intent": "GeneralChat" })));
        let compiler = PlanCompiler::new(Arc::new(model), full_registry(), RouterConfig::new());

        let plan = compiler.compile("아무 말", &empty_history()).await.unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::Converse]);
    }

    #[tokio::test]
    async fn unregistered_kind_is_dropped() {
        // Registry without ComposeMission: the classified kind must be dropped.
        let registry = Arc::new(
            AgentRegistry::new()
                .register(TaskKind::Converse, AgentTraits::read_only(), Arc::new(NoopAgent)),
        );
        let model = FixedModel(Ok(json!({ "tasks": ["ComposeMission"] })));
        let compiler = PlanCompiler::new(Arc::new(model), registry, RouterConfig::new());

        let plan = compiler.compile("미션 줘", &empty_history()).await.unwrap();
        assert_eq!(plan.kinds(), vec![TaskKind::Converse]);
    }

    #[tokio::test]
    async fn caller_identity_reaches_mutating_payloads_only() {
        let compiler = rule_compiler(full_registry());
        let token = AuthToken::new("bearer-1");

        let plan = compiler
            .compile_with_caller("카페 찾아서 게시글 써줘", &empty_history(), Some(&token))
            .await
            .unwrap();

        let lookup = &plan.tasks()[0];
        let post = &plan.tasks()[1];
        assert_eq!(payload_str(&lookup.payload, "auth_token"), None);
        assert_eq!(payload_str(&post.payload, "auth_token"), Some("bearer-1"));
        assert_eq!(
            payload_str(&post.payload, "utterance"),
            Some("카페 찾아서 게시글 써줘")
        );
    }
}
