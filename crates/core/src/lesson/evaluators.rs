//! Turn evaluators: the pluggable judgement step of the lesson driver.

use crate::agents::analysis::{AnalysisInput, AnalysisMetadata, JudgeDecision};
use crate::lesson::{AdvanceMode, StudentTurn, TurnEvaluator, TurnVerdict};
use crate::orchestrator::AnalysisOrchestrator;
use crate::questions;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// The legacy rule-based evaluator: contraction and "like to" checks plus the
/// English-answer guardrail for the translation block. Advancement is
/// detected from the assistant transcript, as the original flow did before
/// the analysis pipeline existed.
#[derive(Default)]
pub struct HeuristicEvaluator;

const FORBIDDEN_CONTRACTIONS: [&str; 5] = ["don't", "can't", "won't", "it's", "i'm"];

const LIKE_VERBS: [&str; 9] = [
    "play", "cook", "read", "dance", "study", "watch", "ride", "go", "practice",
];

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// The grammar shortcuts the platform enforced before the multi-agent
    /// pipeline: no contractions, and "like" must be followed by "to" before
    /// a verb.
    fn grammar_feedback(text: &str) -> Option<String> {
        let lowered = text.to_lowercase();

        if let Some(found) = FORBIDDEN_CONTRACTIONS.iter().find(|c| lowered.contains(**c)) {
            return Some(format!(
                "No uses contracciones. Por favor, di la forma completa (ejemplo: 'do not' en lugar de '{found}')."
            ));
        }

        if lowered.contains("like")
            && !lowered.contains("like to")
            && LIKE_VERBS.iter().any(|v| lowered.contains(*v))
        {
            return Some(
                "Casi 😄 Recuerda usar 'like to' antes del verbo. Por ejemplo: 'I like to cook'."
                    .to_string(),
            );
        }

        None
    }
}

#[async_trait]
impl TurnEvaluator for HeuristicEvaluator {
    async fn evaluate(&self, turn: &StudentTurn) -> TurnVerdict {
        if let Some(feedback) = Self::grammar_feedback(&turn.transcription) {
            return TurnVerdict::Retry {
                instruction: format!(
                    "Error: \"{}\". Feedback: {}. Execute CORRECTION ALGORITHM.",
                    turn.transcription, feedback
                ),
            };
        }

        if questions::is_what_does_question(turn.question_index)
            && questions::looks_like_english_answer(&turn.transcription)
        {
            return TurnVerdict::Retry {
                instruction:
                    "Error: Answered in English. Tell student to translate to Spanish and repeat question."
                        .to_string(),
            };
        }

        TurnVerdict::Advance {
            mode: AdvanceMode::DetectFromTranscript,
        }
    }
}

/// Evaluator backed by the multi-agent analysis pipeline. The judge's
/// decision maps directly onto the verdict, and advancement becomes an
/// explicit structured signal instead of transcript matching.
pub struct AnalysisEvaluator {
    orchestrator: Arc<AnalysisOrchestrator>,
    lesson_number: u32,
}

impl AnalysisEvaluator {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, lesson_number: u32) -> Self {
        Self {
            orchestrator,
            lesson_number,
        }
    }
}

#[async_trait]
impl TurnEvaluator for AnalysisEvaluator {
    async fn evaluate(&self, turn: &StudentTurn) -> TurnVerdict {
        let input = AnalysisInput {
            transcription: turn.transcription.clone(),
            current_question: turn.current_question.clone(),
            question_index: turn.question_index,
            lesson_number: self.lesson_number,
            session_id: turn.session_id.clone(),
            metadata: Some(AnalysisMetadata::default()),
        };

        let output = self.orchestrator.analyze(&input, false).await;
        info!(
            session_id = %turn.session_id,
            decision = ?output.decision,
            "turn evaluated by analysis pipeline"
        );

        if output.should_advance {
            return TurnVerdict::Advance {
                mode: AdvanceMode::Explicit,
            };
        }
        match output.decision {
            JudgeDecision::Ignore => TurnVerdict::Ignore,
            _ => TurnVerdict::Retry {
                instruction: if output.tutor_instruction.is_empty() {
                    "No entendí bien tu respuesta. Por favor, intenta de nuevo.".to_string()
                } else {
                    output.tutor_instruction
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(transcription: &str, question_index: u32) -> StudentTurn {
        StudentTurn {
            transcription: transcription.into(),
            question_index,
            current_question: questions::question_by_index(question_index)
                .unwrap_or_default()
                .into(),
            session_id: "s1".into(),
        }
    }

    #[tokio::test]
    async fn contraction_triggers_retry() {
        let verdict = HeuristicEvaluator::new()
            .evaluate(&turn("I don't like to cook", 7))
            .await;
        match verdict {
            TurnVerdict::Retry { instruction } => {
                assert!(instruction.contains("contracciones"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_like_to_triggers_retry() {
        let verdict = HeuristicEvaluator::new()
            .evaluate(&turn("I like play soccer", 22))
            .await;
        match verdict {
            TurnVerdict::Retry { instruction } => {
                assert!(instruction.contains("like to"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[tokio::test]
    async fn like_to_is_accepted() {
        let verdict = HeuristicEvaluator::new()
            .evaluate(&turn("I like to play soccer", 22))
            .await;
        assert_eq!(
            verdict,
            TurnVerdict::Advance {
                mode: AdvanceMode::DetectFromTranscript
            }
        );
    }

    #[tokio::test]
    async fn english_answer_on_translation_question_retries() {
        let verdict = HeuristicEvaluator::new().evaluate(&turn("computer", 25)).await;
        match verdict {
            TurnVerdict::Retry { instruction } => {
                assert!(instruction.contains("Answered in English"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[tokio::test]
    async fn english_answer_outside_translation_block_is_fine() {
        let verdict = HeuristicEvaluator::new()
            .evaluate(&turn("I am a student", 6))
            .await;
        assert!(matches!(verdict, TurnVerdict::Advance { .. }));
    }

    mod analysis_backed {
        use super::*;
        use crate::inference::InferenceClient;
        use anyhow::Result;
        use async_trait::async_trait;

        /// Routes on the per-agent system prompt and answers with canned
        /// JSON, so the evaluator runs the real orchestrator end to end.
        struct CannedInference {
            verifier_type: &'static str,
            judge_decision: &'static str,
            should_advance: bool,
        }

        #[async_trait]
        impl InferenceClient for CannedInference {
            async fn complete_json(&self, system: &str, _user: &str) -> Result<String> {
                if system.contains("spoken by Spanish speakers") {
                    Ok(r#"{
                        "hasErrors": false,
                        "errors": [],
                        "overallAssessment": "excellent",
                        "correctedTranscription": "Yes, I do.",
                        "feedbackInSpanish": "Perfecto."
                    }"#
                    .to_string())
                } else if system.contains("semantic relevance") {
                    Ok(format!(
                        r#"{{
                            "answersQuestion": true,
                            "relevanceScore": 90,
                            "responseType": "{}",
                            "analysisReason": "canned"
                        }}"#,
                        self.verifier_type
                    ))
                } else {
                    Ok(format!(
                        r#"{{
                            "decision": "{}",
                            "confidence": 90,
                            "shouldAdvance": {},
                            "tutorInstruction": "Hmm, esa respuesta no parece relacionada con la pregunta.",
                            "reasoning": "canned"
                        }}"#,
                        self.judge_decision, self.should_advance
                    ))
                }
            }
        }

        fn evaluator(
            verifier_type: &'static str,
            judge_decision: &'static str,
            should_advance: bool,
        ) -> AnalysisEvaluator {
            AnalysisEvaluator::new(
                Arc::new(AnalysisOrchestrator::new(Arc::new(CannedInference {
                    verifier_type,
                    judge_decision,
                    should_advance,
                }))),
                1,
            )
        }

        #[tokio::test]
        async fn advancing_decision_becomes_explicit_signal() {
            let verdict = evaluator("direct_answer", "advance", true)
                .evaluate(&turn("Yes, I do.", 20))
                .await;
            assert_eq!(
                verdict,
                TurnVerdict::Advance {
                    mode: AdvanceMode::Explicit
                }
            );
        }

        #[tokio::test]
        async fn noise_becomes_ignore() {
            let verdict = evaluator("noise", "ignore", false)
                .evaluate(&turn("mm", 20))
                .await;
            assert_eq!(verdict, TurnVerdict::Ignore);
        }

        #[tokio::test]
        async fn off_topic_becomes_retry_with_tutor_instruction() {
            let verdict = evaluator("off_topic", "off_topic_retry", false)
                .evaluate(&turn("I like tacos", 3))
                .await;
            match verdict {
                TurnVerdict::Retry { instruction } => {
                    assert!(instruction.contains("no parece relacionada"));
                }
                other => panic!("unexpected verdict: {other:?}"),
            }
        }
    }
}
