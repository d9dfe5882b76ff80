//! General-conversation agent

use crate::error::AgentError;
use crate::registry::Agent;
use crate::types::{payload_str, AgentInput, AgentOutput};
use std::sync::Arc;
use waypoint_capability::LanguageModel;

const CHAT_PROMPT: &str = "You are a warm companion for people who have recently moved to a \
rural town. Answer in Korean, briefly and kindly, staying grounded in the conversation so far.";

/// Holds general conversation over the recorded history
pub struct ConverseAgent {
    model: Arc<dyn LanguageModel>,
}

impl ConverseAgent {
    /// Create a conversation agent over a language model
    #[inline]
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait::async_trait]
impl Agent for ConverseAgent {
    async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
        let utterance = payload_str(input.payload, "utterance").unwrap_or_default();
        let prompt = format!("{CHAT_PROMPT}\n\n{utterance}");
        let history = input.history.render_lines();

        let text = self.model.complete(&prompt, &history).await?;
        Ok(AgentOutput::text(text))
    }
}

impl std::fmt::Debug for ConverseAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverseAgent").finish_non_exhaustive()
    }
}
