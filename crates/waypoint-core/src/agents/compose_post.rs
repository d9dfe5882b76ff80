//! Board-post composition agent (mutating)

use crate::error::AgentError;
use crate::registry::Agent;
use crate::types::{fact_str, payload_str, AgentInput, AgentOutput};
use serde_json::{json, Value};
use std::sync::Arc;
use waypoint_capability::{AuthToken, CapabilityError, LanguageModel, SideEffectPort};

const POST_PROMPT: &str = "You are an expert copywriter for a rural community board. Write a \
short, friendly post in Korean based on the user's request and anything already established \
in this conversation.";

/// Categories the board accepts; anything else is coerced to "기타"
const BOARD_CATEGORIES: [&str; 4] = ["일상", "맛집", "추억", "기타"];

/// Composes a community-board post and publishes it through the side-effect
/// capability. Requires a caller identity in the task payload; refuses to
/// mutate anonymously.
pub struct ComposePostAgent {
    model: Arc<dyn LanguageModel>,
    effects: Arc<dyn SideEffectPort>,
}

impl ComposePostAgent {
    /// Create a post-composing agent
    #[inline]
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, effects: Arc<dyn SideEffectPort>) -> Self {
        Self { model, effects }
    }
}

/// Pull the caller identity out of a task payload
pub(super) fn caller_identity(input: &AgentInput<'_>) -> Result<AuthToken, AgentError> {
    payload_str(input.payload, "auth_token")
        .map(AuthToken::new)
        .filter(AuthToken::is_present)
        .ok_or_else(|| AgentError::Precondition("사용자 인증 정보가 없습니다.".to_string()))
}

fn required_str(value: &Value, key: &str) -> Result<String, AgentError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AgentError::Capability(CapabilityError::Malformed(format!(
                "composition output missing '{key}'"
            )))
        })
}

#[async_trait::async_trait]
impl Agent for ComposePostAgent {
    async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
        let auth = caller_identity(&input)?;
        let utterance = payload_str(input.payload, "utterance").unwrap_or_default();

        let mut prompt = format!("{POST_PROMPT}\n\n{utterance}");
        if let Some(location) = fact_str(input.facts, "location") {
            prompt.push_str("\n장소: ");
            prompt.push_str(location);
        }

        let schema = json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "content": { "type": "string" },
                "category": { "type": "string", "enum": BOARD_CATEGORIES }
            }
        });

        let draft = self.model.extract(&prompt, &schema).await?;
        let title = required_str(&draft, "title")?;
        let content = required_str(&draft, "content")?;
        let category = draft
            .get("category")
            .and_then(Value::as_str)
            .filter(|c| BOARD_CATEGORIES.contains(c))
            .unwrap_or("기타")
            .to_string();

        let confirmation = self
            .effects
            .perform(
                "create_post",
                &json!({ "title": title, "content": content, "category": category }),
                &auth,
            )
            .await?;

        tracing::info!(post_id = %confirmation.id, %category, "board post created");

        let text = format!("새 게시글 '{title}'이 등록되었어요!");
        Ok(AgentOutput::text(text)
            .with_fact("post_id", confirmation.id.clone())
            .with_side_effect(confirmation))
    }
}

impl std::fmt::Debug for ComposePostAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposePostAgent").finish_non_exhaustive()
    }
}
