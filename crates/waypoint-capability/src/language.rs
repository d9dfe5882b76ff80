//! Language-model capability
//!
//! Free-form completion for conversational agents and structured extraction
//! for the plan compiler and content-composing agents.

use crate::error::CapabilityError;
use serde_json::Value;

/// Opaque language-model capability.
///
/// Implementations are expected to be `Send + Sync` because one instance is
/// shared across concurrent session runs.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a free-form completion.
    ///
    /// # Arguments
    /// * `prompt` - The instruction for this call
    /// * `history` - Prior conversation turns, oldest first, rendered as
    ///   `role: text` lines by the caller
    async fn complete(&self, prompt: &str, history: &[String]) -> Result<String, CapabilityError>;

    /// Produce a structured value matching `schema`.
    ///
    /// `schema` is a JSON-schema-shaped hint; implementations must return a
    /// value whose top-level keys match the schema's `properties`, or
    /// [`CapabilityError::Malformed`] when they cannot.
    async fn extract(&self, prompt: &str, schema: &Value) -> Result<Value, CapabilityError>;
}
