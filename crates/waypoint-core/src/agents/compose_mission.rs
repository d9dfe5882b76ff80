//! Mission composition agent (mutating)

use super::compose_post::caller_identity;
use crate::error::AgentError;
use crate::registry::Agent;
use crate::types::{fact_str, payload_str, AgentInput, AgentOutput};
use serde_json::{json, Value};
use std::sync::Arc;
use waypoint_capability::{CapabilityError, LanguageModel, SideEffectPort};

const MISSION_PROMPT: &str = "Create a fun and simple resettlement mission for the given place. \
Suggest one concrete activity to do there, in Korean.";

const ASK_FOR_PLACE: &str =
    "어떤 장소에 대한 미션을 만들어 드릴까요? 구체적인 장소나 종류를 알려주세요.";

/// Composes a mission for a known location and assigns it through the
/// side-effect capability.
///
/// The location comes from the `location` shared fact (written by an earlier
/// lookup task) or an explicit payload entry; with neither, the agent answers
/// with a clarification question instead of failing the turn.
pub struct ComposeMissionAgent {
    model: Arc<dyn LanguageModel>,
    effects: Arc<dyn SideEffectPort>,
}

impl ComposeMissionAgent {
    /// Create a mission-composing agent
    #[inline]
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, effects: Arc<dyn SideEffectPort>) -> Self {
        Self { model, effects }
    }
}

#[async_trait::async_trait]
impl Agent for ComposeMissionAgent {
    async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
        let location = fact_str(input.facts, "location")
            .or_else(|| payload_str(input.payload, "location"))
            .map(str::to_string);

        let Some(location) = location else {
            tracing::debug!("no location available, asking the user instead");
            return Ok(AgentOutput::text(ASK_FOR_PLACE));
        };

        let auth = caller_identity(&input)?;

        let prompt = format!("{MISSION_PROMPT}\n장소: {location}");
        let schema = json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "description": { "type": "string" }
            }
        });

        let draft = self.model.extract(&prompt, &schema).await?;
        let title = draft
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::Capability(CapabilityError::Malformed(
                    "mission output missing 'title'".to_string(),
                ))
            })?
            .to_string();
        let description = draft
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let confirmation = self
            .effects
            .perform(
                "create_mission",
                &json!({ "title": title, "description": description, "location": location }),
                &auth,
            )
            .await?;

        tracing::info!(mission_id = %confirmation.id, %location, "mission assigned");

        let text = format!("새로운 미션 '{title}'이 추가되었어요! 지금 확인해 보세요.");
        Ok(AgentOutput::text(text)
            .with_fact("mission_id", confirmation.id.clone())
            .with_side_effect(confirmation))
    }
}

impl std::fmt::Debug for ComposeMissionAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeMissionAgent").finish_non_exhaustive()
    }
}
