//! Fact-lookup agent

use crate::error::AgentError;
use crate::registry::Agent;
use crate::types::{payload_str, AgentInput, AgentOutput};
use std::sync::Arc;
use waypoint_capability::LocationLookup;

/// Queries the civic-data store and publishes what it found as shared facts
/// (`location`, `category`, `region`) for later tasks in the same plan.
pub struct LookupFactAgent {
    lookup: Arc<dyn LocationLookup>,
}

impl LookupFactAgent {
    /// Create a lookup agent over a civic-data capability
    #[inline]
    #[must_use]
    pub fn new(lookup: Arc<dyn LocationLookup>) -> Self {
        Self { lookup }
    }

    /// Category to query: an explicit `category` payload entry, else the
    /// leading token of the utterance ("카페 찾아서 ..." -> "카페").
    fn category_of(input: &AgentInput<'_>) -> Option<String> {
        if let Some(category) = payload_str(input.payload, "category") {
            return Some(category.to_string());
        }
        payload_str(input.payload, "utterance")
            .and_then(|u| u.split_whitespace().next())
            .map(str::to_string)
    }
}

#[async_trait::async_trait]
impl Agent for LookupFactAgent {
    async fn invoke(&self, input: AgentInput<'_>) -> Result<AgentOutput, AgentError> {
        let category = Self::category_of(&input)
            .ok_or_else(|| AgentError::Precondition("조회할 종류".to_string()))?;
        let region = payload_str(input.payload, "region");

        tracing::debug!(%category, ?region, "looking up civic data");

        let record = self
            .lookup
            .find_by_category(&category, region)
            .await?
            .ok_or_else(|| AgentError::NotFound(category.clone()))?;

        let text = format!(
            "'{}'을(를) 찾았어요: {} ({})",
            record.name, record.description, record.region
        );

        Ok(AgentOutput::text(text)
            .with_fact("location", record.name)
            .with_fact("category", record.category)
            .with_fact("region", record.region))
    }
}

impl std::fmt::Debug for LookupFactAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupFactAgent").finish_non_exhaustive()
    }
}
