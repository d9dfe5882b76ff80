//! Core types for the Waypoint router
//!
//! Defines the data model of one routing invocation:
//! - Task kinds and tasks
//! - Work plans (ordered, non-empty, gap-free)
//! - The engine-owned execution context and its shared facts
//! - Step results, outcomes and the final response

use crate::error::PlanError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use ulid::Ulid;
use waypoint_capability::Confirmation;
use waypoint_store::{ConversationSnapshot, SessionId};

/// Unique task identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Ulid);

impl TaskId {
    /// Generate new task ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique work-plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Ulid);

impl PlanId {
    /// Generate new plan ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of capabilities an utterance can be routed to.
///
/// The set is closed on purpose: misrouting is a registration-time concern,
/// never a runtime string-key miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Hold general conversation over the session history
    Converse,
    /// Query the civic-data store for a place/fact
    LookupFact,
    /// Compose and publish a community-board post
    ComposePost,
    /// Compose and assign a resettlement mission
    ComposeMission,
}

impl TaskKind {
    /// All kinds, in registration order
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Converse,
        TaskKind::LookupFact,
        TaskKind::ComposePost,
        TaskKind::ComposeMission,
    ];

    /// Canonical name used in classifier output
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Converse => "Converse",
            TaskKind::LookupFact => "LookupFact",
            TaskKind::ComposePost => "ComposePost",
            TaskKind::ComposeMission => "ComposeMission",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Converse" => Ok(TaskKind::Converse),
            "LookupFact" => Ok(TaskKind::LookupFact),
            "ComposePost" => Ok(TaskKind::ComposePost),
            "ComposeMission" => Ok(TaskKind::ComposeMission),
            other => Err(UnknownTaskKind(other.to_string())),
        }
    }
}

/// A classifier named a kind outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task kind: {0}")]
pub struct UnknownTaskKind(pub String);

/// Opaque task arguments
pub type Payload = serde_json::Map<String, Value>;

/// Get a string value from a payload
#[inline]
#[must_use]
pub fn payload_str<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// One unit of routed work.
///
/// Immutable once created; owned by the execution engine for the duration of
/// a single run. Tasks never know or update their own position in the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: TaskId,
    /// Which agent capability this task requires
    pub kind: TaskKind,
    /// Opaque arguments for the agent
    pub payload: Payload,
    /// Position within the plan (strictly increasing, no gaps)
    pub sequence_index: usize,
}

/// Ordered, non-empty sequence of tasks compiled from one utterance
#[derive(Debug, Clone)]
pub struct WorkPlan {
    id: PlanId,
    tasks: Vec<Task>,
}

impl WorkPlan {
    /// Build a plan from kind/payload pairs, assigning sequence indices.
    ///
    /// # Errors
    /// `PlanError::Empty` when `steps` is empty.
    pub fn from_steps(
        steps: impl IntoIterator<Item = (TaskKind, Payload)>,
    ) -> Result<Self, PlanError> {
        let tasks: Vec<Task> = steps
            .into_iter()
            .enumerate()
            .map(|(sequence_index, (kind, payload))| Task {
                id: TaskId::new(),
                kind,
                payload,
                sequence_index,
            })
            .collect();
        Self::from_tasks(tasks)
    }

    /// Build a plan from pre-built tasks, validating the sequence invariant.
    ///
    /// # Errors
    /// - `PlanError::Empty` for a zero-task plan
    /// - `PlanError::NonContiguous` when indices are not `0..n` in order
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, PlanError> {
        if tasks.is_empty() {
            return Err(PlanError::Empty);
        }
        for (expected, task) in tasks.iter().enumerate() {
            if task.sequence_index != expected {
                return Err(PlanError::NonContiguous {
                    expected,
                    found: task.sequence_index,
                });
            }
        }
        Ok(Self {
            id: PlanId::new(),
            tasks,
        })
    }

    /// Plan identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> PlanId {
        self.id
    }

    /// Tasks in sequence order
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// A validated plan is never empty; kept for API symmetry
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Kinds in sequence order (handy for logging and tests)
    #[must_use]
    pub fn kinds(&self) -> Vec<TaskKind> {
        self.tasks.iter().map(|t| t.kind).collect()
    }
}

/// Facts written by one task and readable by later tasks in the same plan.
///
/// Insertion-ordered so transcripts and logs stay deterministic.
pub type SharedFacts = IndexMap<String, Value>;

/// Get a string fact
#[inline]
#[must_use]
pub fn fact_str<'a>(facts: &'a SharedFacts, key: &str) -> Option<&'a str> {
    facts.get(key).and_then(Value::as_str)
}

/// Mutable accumulator threaded through one engine run.
///
/// Owned exclusively by the engine; never shared across runs or sessions.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    completed: Vec<StepResult>,
    shared_facts: SharedFacts,
}

impl ExecutionContext {
    /// Fresh context for a new run
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts visible to the next task
    #[inline]
    #[must_use]
    pub fn facts(&self) -> &SharedFacts {
        &self.shared_facts
    }

    /// Completed steps so far
    #[inline]
    #[must_use]
    pub fn completed(&self) -> &[StepResult] {
        &self.completed
    }

    /// Merge facts produced by a successful step (later writers win)
    pub fn merge_facts(&mut self, facts: SharedFacts) {
        self.shared_facts.extend(facts);
    }

    /// Record a finished step
    pub fn record(&mut self, step: StepResult) {
        self.completed.push(step);
    }

    /// Consume the context into its transcript
    #[inline]
    #[must_use]
    pub fn into_transcript(self) -> Vec<StepResult> {
        self.completed
    }
}

/// Why a step failed.
///
/// Always a value, never a raw error: nothing from a task invocation
/// propagates past the engine boundary as an unhandled fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The task exceeded its wall-clock budget
    Timeout {
        /// The budget that was exceeded
        budget: Duration,
    },
    /// A read-only lookup found nothing for the query
    NotFound(String),
    /// A required input (auth token, shared fact) was missing
    Precondition(String),
    /// An external capability failed
    Capability(String),
    /// No agent is registered for the task's kind
    Unregistered(TaskKind),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Timeout { budget } => {
                write!(f, "timed out after {}s", budget.as_secs())
            }
            FailureReason::NotFound(what) => write!(f, "not found: {what}"),
            FailureReason::Precondition(what) => write!(f, "precondition failed: {what}"),
            FailureReason::Capability(what) => write!(f, "capability failed: {what}"),
            FailureReason::Unregistered(kind) => write!(f, "no agent registered for {kind}"),
        }
    }
}

/// Outcome of one task execution
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The task produced text and zero or more side-effect confirmations
    Success {
        /// Text fragment contributed to the final response
        text: String,
        /// Confirmations for externally-visible mutations, with persisted ids
        side_effects: Vec<Confirmation>,
    },
    /// The task failed; the reason is a value, not an exception
    Failure {
        /// Why the task failed
        reason: FailureReason,
    },
}

impl Outcome {
    /// Whether this outcome is a success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Result of executing one task
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The task this result answers
    pub task_id: TaskId,
    /// Kind of the task
    pub kind: TaskKind,
    /// Position of the task in its plan
    pub sequence_index: usize,
    /// What happened
    pub outcome: Outcome,
    /// Wall-clock duration of the invocation
    pub duration: Duration,
}

impl StepResult {
    /// Whether the step succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// User-facing response for one routing invocation
#[derive(Debug, Clone)]
pub struct FinalResponse {
    /// Aggregated user-facing message
    pub text: String,
    /// Ordered step results for the whole run
    pub transcript: Vec<StepResult>,
    /// Session the response belongs to
    pub session_id: SessionId,
}

/// Read-only view an agent receives for one invocation.
///
/// Agents see the task payload, the facts written by earlier tasks, and the
/// conversation snapshot taken when the plan was compiled. They never see
/// their own position in the plan.
#[derive(Debug, Clone, Copy)]
pub struct AgentInput<'a> {
    /// Task arguments
    pub payload: &'a Payload,
    /// Facts from earlier tasks in the same plan
    pub facts: &'a SharedFacts,
    /// Conversation history at compile time
    pub history: &'a ConversationSnapshot,
}

/// What an agent hands back on success
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    /// Text fragment for the final response
    pub text: String,
    /// Facts to publish to later tasks
    pub facts: SharedFacts,
    /// Confirmations for performed mutations
    pub side_effects: Vec<Confirmation>,
}

impl AgentOutput {
    /// Text-only output
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Publish a fact to later tasks
    #[inline]
    #[must_use]
    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    /// Attach a side-effect confirmation
    #[inline]
    #[must_use]
    pub fn with_side_effect(mut self, confirmation: Confirmation) -> Self {
        self.side_effects.push(confirmation);
        self
    }
}
