//! Deterministic capability implementations
//!
//! Stand-ins for the real LLM provider, civic-data store and board API.
//! The keyword classifier mirrors what the production router asks its LLM
//! to do: map an utterance to an ordered list of task-kind names. These
//! implementations back the CLI and the scenario tests; nothing in the
//! router core depends on them.

use crate::effect::{AuthToken, Confirmation, SideEffectPort};
use crate::error::CapabilityError;
use crate::language::LanguageModel;
use crate::lookup::{LocationLookup, LocationRecord};
use dashmap::DashMap;
use serde_json::{json, Value};
use ulid::Ulid;

/// Keyword-driven language model.
///
/// `extract` inspects the requested schema to decide which shape to
/// produce: a classification (`tasks`), a board post (`title`/`content`/
/// `category`) or a mission card (`title`/`description`).
#[derive(Debug, Default)]
pub struct RuleBasedLanguageModel;

impl RuleBasedLanguageModel {
    /// Create a new rule-based model
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classify an utterance into ordered task-kind names.
    ///
    /// Order follows first keyword occurrence, matching the order the user
    /// implied ("찾아서 게시글 써줘" -> lookup before post).
    fn classify(utterance: &str) -> Vec<String> {
        let lowered = utterance.to_lowercase();
        // Classification prompts carry history above a final `사용자:` marker;
        // only the text after that marker is the request to classify.
        let lowered = lowered
            .rsplit("사용자:")
            .next()
            .unwrap_or(&lowered)
            .to_string();
        let mut hits: Vec<(usize, &str)> = Vec::new();

        let groups: &[(&[&str], &str)] = &[
            (&["찾아", "검색", "어디", "알려줄 만한"], "LookupFact"),
            (&["게시글", "포스트", "post", "글 써", "글을 써"], "ComposePost"),
            (&["미션", "mission"], "ComposeMission"),
        ];

        for (keywords, kind) in groups {
            if let Some(idx) = keywords.iter().filter_map(|k| lowered.find(*k)).min() {
                hits.push((idx, kind));
            }
        }

        hits.sort_by_key(|(idx, _)| *idx);
        hits.into_iter().map(|(_, kind)| kind.to_string()).collect()
    }

    /// Pull a `장소: <name>` line out of a composition prompt, if present
    fn subject_of(prompt: &str) -> Option<String> {
        prompt.lines().find_map(|line| {
            line.trim()
                .strip_prefix("장소:")
                .map(|rest| rest.trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }

    fn schema_keys(schema: &Value) -> Vec<String> {
        schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LanguageModel for RuleBasedLanguageModel {
    async fn complete(&self, prompt: &str, history: &[String]) -> Result<String, CapabilityError> {
        let opener = if history.is_empty() {
            "반가워요! 함안 정착을 돕는 웨이포인트예요."
        } else {
            "말씀 감사해요."
        };
        let excerpt: String = prompt.chars().take(40).collect();
        Ok(format!("{opener} '{excerpt}'에 대해 함께 이야기해 볼까요?"))
    }

    async fn extract(&self, prompt: &str, schema: &Value) -> Result<Value, CapabilityError> {
        let keys = Self::schema_keys(schema);

        if keys.iter().any(|k| k == "tasks") {
            return Ok(json!({ "tasks": Self::classify(prompt) }));
        }

        if keys.iter().any(|k| k == "content") {
            let subject = Self::subject_of(prompt);
            let title = subject
                .as_deref()
                .map_or_else(|| "우리 동네 이야기".to_string(), |s| format!("{s} 방문 후기"));
            let content = subject.as_deref().map_or_else(
                || "오늘 함안에서 보낸 하루를 기록해요.".to_string(),
                |s| format!("{s}에 다녀왔어요. 함안에 오신 분들께 추천합니다!"),
            );
            return Ok(json!({ "title": title, "content": content, "category": "일상" }));
        }

        if keys.iter().any(|k| k == "description") {
            let subject = Self::subject_of(prompt);
            let title = subject
                .as_deref()
                .map_or_else(|| "동네 탐방 미션".to_string(), |s| format!("{s} 방문 미션"));
            let description = subject.as_deref().map_or_else(
                || "이번 주에 동네의 새로운 장소를 한 곳 방문해 보세요.".to_string(),
                |s| format!("{s}에 방문해서 가장 마음에 드는 것을 사진으로 남겨 보세요."),
            );
            return Ok(json!({ "title": title, "description": description }));
        }

        Err(CapabilityError::Malformed(format!(
            "unsupported schema keys: {keys:?}"
        )))
    }
}

/// In-memory civic-data table
#[derive(Debug, Default)]
pub struct StaticLocationLookup {
    records: Vec<LocationRecord>,
}

impl StaticLocationLookup {
    /// Create an empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record
    #[inline]
    #[must_use]
    pub fn with_record(mut self, record: LocationRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Sample table for the CLI demo, seeded with Haman-gun places
    #[must_use]
    pub fn haman_sample() -> Self {
        Self::new()
            .with_record(LocationRecord::new(
                "카페 온",
                "카페",
                "함안",
                "시그니처 음료가 유명한 조용한 카페",
            ))
            .with_record(LocationRecord::new(
                "함안 도서관",
                "도서관",
                "함안",
                "귀촌인 대상 프로그램을 운영하는 군립 도서관",
            ))
            .with_record(LocationRecord::new(
                "가야 전통시장",
                "시장",
                "함안",
                "5일장이 서는 전통시장",
            ))
    }
}

#[async_trait::async_trait]
impl LocationLookup for StaticLocationLookup {
    async fn find_by_category(
        &self,
        category: &str,
        region: Option<&str>,
    ) -> Result<Option<LocationRecord>, CapabilityError> {
        let query = category.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let found = self
            .records
            .iter()
            .filter(|r| region.map_or(true, |reg| r.region == reg))
            .find(|r| r.category == query || query.contains(&r.category))
            .cloned();

        Ok(found)
    }
}

/// In-memory side-effect recorder.
///
/// Each performed action is kept under its confirmation id so tests can
/// assert exactly which mutations happened (and that halted plans created
/// none).
#[derive(Debug, Default)]
pub struct MemorySideEffects {
    performed: DashMap<String, Value>,
}

impl MemorySideEffects {
    /// Create an empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of side effects performed so far
    #[inline]
    #[must_use]
    pub fn performed_count(&self) -> usize {
        self.performed.len()
    }

    /// Payload recorded under a confirmation id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<Value> {
        self.performed.get(id).map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl SideEffectPort for MemorySideEffects {
    async fn perform(
        &self,
        action: &str,
        payload: &Value,
        auth: &AuthToken,
    ) -> Result<Confirmation, CapabilityError> {
        if !auth.is_present() {
            return Err(CapabilityError::Unauthorized);
        }

        let id = Ulid::new().to_string();
        self.performed
            .insert(id.clone(), json!({ "action": action, "payload": payload }));

        let summary = match action {
            "create_post" => format!("게시글이 등록되었어요 (#{id})"),
            "create_mission" => format!("새 미션이 추가되었어요 (#{id})"),
            other => format!("{other} completed (#{id})"),
        };

        tracing::debug!(action, %id, "side effect performed");

        Ok(Confirmation {
            id,
            action: action.to_string(),
            summary,
        })
    }
}
