//! Execution engine
//!
//! Runs a work plan's tasks strictly in sequence order, threading an
//! engine-owned context (completed steps + shared facts) forward. The engine
//! is the sole owner of plan position; agents never see or update it.
//!
//! Failure policy: every task fault (agent error, timeout, missing
//! registration) becomes a `StepResult` failure value. A failure halts the
//! remaining plan unless the task's kind is registered best-effort.

use crate::aggregate::aggregate;
use crate::config::RouterConfig;
use crate::error::AgentError;
use crate::registry::AgentRegistry;
use crate::types::{
    AgentInput, ExecutionContext, FailureReason, FinalResponse, Outcome, SharedFacts, StepResult,
    Task, WorkPlan,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use waypoint_capability::CapabilityError;
use waypoint_store::ConversationSnapshot;

/// Cooperative cancellation flag shared with the session transport.
///
/// Cancelling lets the in-flight task finish (mutating effects are never
/// left half-applied) but prevents any queued task from starting.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New, un-cancelled flag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of queued tasks
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sequential plan executor
#[derive(Debug)]
pub struct ExecutionEngine {
    registry: Arc<AgentRegistry>,
    config: RouterConfig,
}

impl ExecutionEngine {
    /// Create an engine over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>, config: RouterConfig) -> Self {
        Self { registry, config }
    }

    /// Run a plan to completion (or first halting failure).
    ///
    /// Infallible at this boundary: every task fault is folded into the
    /// transcript and the aggregated text.
    pub async fn run(&self, plan: &WorkPlan, history: &ConversationSnapshot) -> FinalResponse {
        self.run_with_cancel(plan, history, &CancelFlag::new())
            .await
    }

    /// Run a plan, honoring a cancellation flag between tasks
    pub async fn run_with_cancel(
        &self,
        plan: &WorkPlan,
        history: &ConversationSnapshot,
        cancel: &CancelFlag,
    ) -> FinalResponse {
        let mut ctx = ExecutionContext::new();

        tracing::info!(plan_id = %plan.id(), tasks = plan.len(), "executing work plan");

        for task in plan.tasks() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    plan_id = %plan.id(),
                    sequence_index = task.sequence_index,
                    "run cancelled, skipping queued tasks"
                );
                break;
            }

            let (step, facts) = self.execute_task(task, &ctx, history).await;
            let halted = !step.is_success() && !self.is_best_effort(task);

            ctx.merge_facts(facts);

            if let Outcome::Failure { reason } = &step.outcome {
                tracing::warn!(
                    kind = %task.kind,
                    sequence_index = task.sequence_index,
                    %reason,
                    halted,
                    "task failed"
                );
            }

            ctx.record(step);
            if halted {
                break;
            }
        }

        let transcript = ctx.into_transcript();
        let text = aggregate(&transcript);

        FinalResponse {
            text,
            transcript,
            session_id: history.session().clone(),
        }
    }

    /// Execute one task, converting every fault into an outcome value.
    ///
    /// Successful steps also yield the facts the agent published, which the
    /// caller merges into the context before the next task starts.
    async fn execute_task(
        &self,
        task: &Task,
        ctx: &ExecutionContext,
        history: &ConversationSnapshot,
    ) -> (StepResult, SharedFacts) {
        let started = Instant::now();
        let mut facts = SharedFacts::new();

        let outcome = match self.registry.resolve(task.kind) {
            None => Outcome::Failure {
                reason: FailureReason::Unregistered(task.kind),
            },
            Some(entry) => {
                let input = AgentInput {
                    payload: &task.payload,
                    facts: ctx.facts(),
                    history,
                };
                let budget = self.config.task_timeout();
                match tokio::time::timeout(budget, entry.handle.invoke(input)).await {
                    Err(_) => Outcome::Failure {
                        reason: FailureReason::Timeout { budget },
                    },
                    Ok(Err(error)) => Outcome::Failure {
                        reason: failure_reason(error),
                    },
                    Ok(Ok(output)) => {
                        facts = output.facts;
                        Outcome::Success {
                            text: output.text,
                            side_effects: output.side_effects,
                        }
                    }
                }
            }
        };

        let step = StepResult {
            task_id: task.id,
            kind: task.kind,
            sequence_index: task.sequence_index,
            outcome,
            duration: started.elapsed(),
        };
        (step, facts)
    }

    fn is_best_effort(&self, task: &Task) -> bool {
        self.registry
            .resolve(task.kind)
            .map(|entry| entry.traits.best_effort)
            .unwrap_or(false)
    }
}

/// Fold an agent error into a step failure reason
fn failure_reason(error: AgentError) -> FailureReason {
    match error {
        AgentError::NotFound(what) => FailureReason::NotFound(what),
        AgentError::Precondition(what) => FailureReason::Precondition(what),
        AgentError::Capability(CapabilityError::Unauthorized) => {
            FailureReason::Precondition("사용자 인증 정보가 없습니다.".to_string())
        }
        AgentError::Capability(other) => FailureReason::Capability(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Agent, AgentTraits};
    use crate::types::{fact_str, payload_str, AgentOutput, Payload, TaskKind};
    use serde_json::json;
    use std::time::Duration;
    use waypoint_store::SessionId;

    fn history() -> ConversationSnapshot {
        ConversationSnapshot::empty(SessionId::new("s1"))
    }

    fn plan_of(kinds: &[TaskKind]) -> WorkPlan {
        WorkPlan::from_steps(kinds.iter().map(|&kind| {
            let mut payload = Payload::new();
            payload.insert("utterance".to_string(), json!("테스트"));
            (kind, payload)
        }))
        .unwrap()
    }

    /// Publishes a fact, succeeds
    struct FactWriter;

    #[async_trait::async_trait]
    impl Agent for FactWriter {
        async fn invoke(&self, _input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::text("found").with_fact("location", "카페 온"))
        }
    }

    /// Succeeds only when the `location` fact is visible
    struct FactReader;

    #[async_trait::async_trait]
    impl Agent for FactReader {
        async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
            let location = fact_str(input.facts, "location")
                .ok_or_else(|| AgentError::Precondition("location fact".into()))?;
            Ok(AgentOutput::text(format!("posted about {location}")))
        }
    }

    /// Always fails
    struct AlwaysFails;

    #[async_trait::async_trait]
    impl Agent for AlwaysFails {
        async fn invoke(&self, _input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
            Err(AgentError::NotFound("그런 장소".into()))
        }
    }

    /// Never finishes within a short budget
    struct Sleeper;

    #[async_trait::async_trait]
    impl Agent for Sleeper {
        async fn invoke(&self, _input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(AgentOutput::text("too late"))
        }
    }

    #[tokio::test]
    async fn facts_flow_forward_between_tasks() {
        let registry = Arc::new(
            AgentRegistry::new()
                .register(TaskKind::LookupFact, AgentTraits::read_only(), Arc::new(FactWriter))
                .register(TaskKind::ComposePost, AgentTraits::mutating(), Arc::new(FactReader)),
        );
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::LookupFact, TaskKind::ComposePost]);
        let response = engine.run(&plan, &history()).await;

        assert_eq!(response.transcript.len(), 2);
        assert!(response.transcript.iter().all(StepResult::is_success));
        assert!(response.text.contains("posted about 카페 온"));
    }

    #[tokio::test]
    async fn halting_failure_stops_the_plan() {
        let registry = Arc::new(
            AgentRegistry::new()
                .register(TaskKind::LookupFact, AgentTraits::read_only(), Arc::new(AlwaysFails))
                .register(TaskKind::ComposePost, AgentTraits::mutating(), Arc::new(FactReader)),
        );
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::LookupFact, TaskKind::ComposePost]);
        let response = engine.run(&plan, &history()).await;

        // Halted after the first task; the second never ran.
        assert_eq!(response.transcript.len(), 1);
        assert!(!response.transcript[0].is_success());
    }

    #[tokio::test]
    async fn best_effort_failure_continues() {
        let registry = Arc::new(
            AgentRegistry::new()
                .register(
                    TaskKind::LookupFact,
                    AgentTraits::read_only().best_effort(),
                    Arc::new(AlwaysFails),
                )
                .register(TaskKind::Converse, AgentTraits::read_only(), Arc::new(FactWriter)),
        );
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::LookupFact, TaskKind::Converse]);
        let response = engine.run(&plan, &history()).await;

        assert_eq!(response.transcript.len(), 2);
        assert!(!response.transcript[0].is_success());
        assert!(response.transcript[1].is_success());
    }

    #[tokio::test]
    async fn timeout_becomes_a_failure_outcome() {
        let registry = Arc::new(AgentRegistry::new().register(
            TaskKind::Converse,
            AgentTraits::read_only(),
            Arc::new(Sleeper),
        ));
        let config = RouterConfig::new().with_task_timeout_secs(0);
        let engine = ExecutionEngine::new(registry, config);

        let plan = plan_of(&[TaskKind::Converse]);
        let response = engine.run(&plan, &history()).await;

        assert_eq!(response.transcript.len(), 1);
        assert!(matches!(
            response.transcript[0].outcome,
            Outcome::Failure {
                reason: FailureReason::Timeout { .. }
            }
        ));
    }

    #[tokio::test]
    async fn unregistered_kind_is_a_failure_not_a_panic() {
        let registry = Arc::new(AgentRegistry::new());
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::Converse]);
        let response = engine.run(&plan, &history()).await;

        assert_eq!(response.transcript.len(), 1);
        assert!(matches!(
            response.transcript[0].outcome,
            Outcome::Failure {
                reason: FailureReason::Unregistered(TaskKind::Converse)
            }
        ));
        assert!(!response.text.is_empty());
    }

    #[tokio::test]
    async fn cancellation_skips_queued_tasks() {
        struct Canceller(CancelFlag);

        #[async_trait::async_trait]
        impl Agent for Canceller {
            async fn invoke(&self, _input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
                // The client "disconnects" while the first task is in flight.
                self.0.cancel();
                Ok(AgentOutput::text("첫 번째 작업"))
            }
        }

        let cancel = CancelFlag::new();
        let registry = Arc::new(
            AgentRegistry::new()
                .register(
                    TaskKind::LookupFact,
                    AgentTraits::read_only(),
                    Arc::new(Canceller(cancel.clone())),
                )
                .register(TaskKind::ComposePost, AgentTraits::mutating(), Arc::new(FactReader)),
        );
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::LookupFact, TaskKind::ComposePost]);
        let response = engine.run_with_cancel(&plan, &history(), &cancel).await;

        // In-flight task finished; the queued one never started.
        assert_eq!(response.transcript.len(), 1);
        assert!(response.transcript[0].is_success());
    }

    #[tokio::test]
    async fn transcript_preserves_sequence_order() {
        let registry = Arc::new(
            AgentRegistry::new()
                .register(TaskKind::LookupFact, AgentTraits::read_only(), Arc::new(FactWriter))
                .register(TaskKind::ComposePost, AgentTraits::mutating(), Arc::new(FactReader))
                .register(TaskKind::Converse, AgentTraits::read_only(), Arc::new(FactWriter)),
        );
        let engine = ExecutionEngine::new(registry, RouterConfig::new());

        let plan = plan_of(&[TaskKind::LookupFact, TaskKind::ComposePost, TaskKind::Converse]);
        let response = engine.run(&plan, &history()).await;

        let indices: Vec<usize> = response
            .transcript
            .iter()
            .map(|s| s.sequence_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn payload_helper_reads_strings() {
        let mut payload = Payload::new();
        payload.insert("utterance".to_string(), json!("안녕"));
        assert_eq!(payload_str(&payload, "utterance"), Some("안녕"));
        assert_eq!(payload_str(&payload, "missing"), None);
    }
}
