//! Result aggregation
//!
//! Merges a run's step results into one user-facing message. Pure function
//! of the transcript: same transcript, same text. Raw error text never
//! reaches the user; failures are rendered as templated, actionable Korean
//! apologies.

use crate::types::{FailureReason, Outcome, StepResult};

/// Fallback when a transcript is empty (cancelled before the first task)
const EMPTY_RUN_TEXT: &str = "요청이 처리되지 못했어요. 다시 한 번 말씀해 주세요.";

/// Merge step results into the final user-facing text.
///
/// Success texts are joined in transcript order; when the last step failed,
/// an apology specific to the failure reason is appended (or stands alone
/// for a fully failed plan).
#[must_use]
pub fn aggregate(transcript: &[StepResult]) -> String {
    let Some(last) = transcript.last() else {
        return EMPTY_RUN_TEXT.to_string();
    };

    let mut parts: Vec<String> = transcript
        .iter()
        .filter_map(|step| match &step.outcome {
            Outcome::Success { text, .. } if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
        .collect();

    if let Outcome::Failure { reason } = &last.outcome {
        parts.push(render_apology(reason));
    }

    if parts.is_empty() {
        // Every step succeeded with blank text; still answer something.
        return EMPTY_RUN_TEXT.to_string();
    }

    parts.join("\n\n")
}

/// Render one failure reason as an actionable apology
fn render_apology(reason: &FailureReason) -> String {
    match reason {
        FailureReason::Timeout { .. } => {
            "죄송해요, 답변을 준비하는 데 시간이 너무 오래 걸렸어요. 잠시 후 다시 시도해 주세요.".to_string()
        }
        FailureReason::NotFound(what) => format!(
            "죄송해요, '{what}'에 대한 정보를 찾지 못했어요. 다른 장소나 종류로 다시 물어봐 주시겠어요?"
        ),
        FailureReason::Precondition(what) => {
            format!("죄송해요, 요청을 진행할 수 없었어요 ({what}). 확인 후 다시 시도해 주세요.")
        }
        FailureReason::Capability(_) | FailureReason::Unregistered(_) => {
            "죄송해요, 답변을 만드는 중에 문제가 생겼어요. 잠시 후 다시 시도해 주세요.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskId, TaskKind};
    use std::time::Duration;

    fn success(index: usize, text: &str) -> StepResult {
        StepResult {
            task_id: TaskId::new(),
            kind: TaskKind::Converse,
            sequence_index: index,
            outcome: Outcome::Success {
                text: text.to_string(),
                side_effects: Vec::new(),
            },
            duration: Duration::from_millis(1),
        }
    }

    fn failure(index: usize, reason: FailureReason) -> StepResult {
        StepResult {
            task_id: TaskId::new(),
            kind: TaskKind::LookupFact,
            sequence_index: index,
            outcome: Outcome::Failure { reason },
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn successes_join_in_order() {
        let transcript = vec![success(0, "첫째"), success(1, "둘째")];
        assert_eq!(aggregate(&transcript), "첫째\n\n둘째");
    }

    #[test]
    fn trailing_failure_appends_apology() {
        let transcript = vec![
            success(0, "카페 온을 찾았어요."),
            failure(1, FailureReason::NotFound("미션 장소".into())),
        ];
        let text = aggregate(&transcript);
        assert!(text.starts_with("카페 온을 찾았어요."));
        assert!(text.contains("죄송해요"));
        assert!(text.contains("미션 장소"));
    }

    #[test]
    fn fully_failed_plan_yields_single_coherent_message() {
        let transcript = vec![failure(0, FailureReason::Timeout {
            budget: Duration::from_secs(30),
        })];
        let text = aggregate(&transcript);
        assert!(text.contains("죄송해요"));
        // Never a raw error rendering.
        assert!(!text.contains("Timeout"));
        assert!(!text.contains("30"));
    }

    #[test]
    fn mid_plan_best_effort_failure_is_not_surfaced_as_apology() {
        let transcript = vec![
            failure(0, FailureReason::NotFound("카페".into())),
            success(1, "그래도 대화는 계속해요."),
        ];
        assert_eq!(aggregate(&transcript), "그래도 대화는 계속해요.");
    }

    #[test]
    fn empty_transcript_still_answers() {
        assert!(!aggregate(&[]).is_empty());
    }

    #[test]
    fn blank_success_text_still_answers() {
        let transcript = vec![success(0, "   ")];
        assert!(!aggregate(&transcript).is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_reason() -> impl Strategy<Value = FailureReason> {
            prop_oneof![
                Just(FailureReason::Timeout {
                    budget: Duration::from_secs(30)
                }),
                "[a-z가-힣]{1,12}".prop_map(FailureReason::NotFound),
                "[a-z가-힣]{1,12}".prop_map(FailureReason::Precondition),
                "[a-z가-힣]{1,12}".prop_map(FailureReason::Capability),
            ]
        }

        fn arb_step(index: usize) -> impl Strategy<Value = StepResult> {
            prop_oneof![
                "[a-z가-힣 ]{0,24}".prop_map(move |text| success(index, &text)),
                arb_reason().prop_map(move |reason| failure(index, reason)),
            ]
        }

        fn arb_transcript() -> impl Strategy<Value = Vec<StepResult>> {
            prop::collection::vec(any::<bool>(), 0..6).prop_flat_map(|slots| {
                slots
                    .into_iter()
                    .enumerate()
                    .map(|(i, _)| arb_step(i).boxed())
                    .collect::<Vec<_>>()
            })
        }

        proptest! {
            /// Aggregation is deterministic: same transcript, same text.
            #[test]
            fn aggregate_is_pure(transcript in arb_transcript()) {
                prop_assert_eq!(aggregate(&transcript), aggregate(&transcript));
            }

            /// The aggregate never emits an empty message.
            #[test]
            fn aggregate_is_never_empty(transcript in arb_transcript()) {
                prop_assert!(!aggregate(&transcript).is_empty());
            }
        }
    }
}
