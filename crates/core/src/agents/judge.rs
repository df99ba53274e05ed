//! Judge Agent
//!
//! Synthesizes the grammar and verifier analyses into a single pedagogical
//! decision. The decision itself is derived deterministically from the
//! priority rules in [`decision_for`]; the inference service only writes the
//! tutor's wording for that decision. If the model disagrees with the policy,
//! the policy wins.

use crate::agents::analysis::{
    GrammarAgentOutput, GrammarAssessment, GrammarSeverity, JudgeAgentOutput, JudgeDecision,
    JudgeInput, ResponseType, VerifierAgentOutput,
};
use crate::agents::prompts::{JUDGE_AGENT_PROMPT, JUDGE_SYSTEM_CONTEXT};
use crate::agents::types::AgentReport;
use crate::inference::InferenceClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Threshold below which a partial answer is treated as needing clarification.
const PARTIAL_ANSWER_FLOOR: u8 = 50;

/// The decision priority table. Rules are evaluated top to bottom; the first
/// match wins.
pub fn decision_for(grammar: &GrammarAgentOutput, verifier: &VerifierAgentOutput) -> JudgeDecision {
    match verifier.response_type {
        ResponseType::Noise => JudgeDecision::Ignore,
        ResponseType::OffTopic => JudgeDecision::OffTopicRetry,
        ResponseType::ClarificationNeeded => JudgeDecision::ClarifyAndRetry,
        ResponseType::PartialAnswer if verifier.relevance_score < PARTIAL_ANSWER_FLOOR => {
            JudgeDecision::ClarifyAndRetry
        }
        // The answer is good from here on; grammar decides the rest.
        _ => {
            if grammar.max_severity() == Some(GrammarSeverity::Major) {
                JudgeDecision::CorrectAndRetry
            } else if matches!(
                grammar.overall_assessment,
                GrammarAssessment::Excellent | GrammarAssessment::Good
            ) {
                JudgeDecision::Advance
            } else if grammar
                .errors
                .iter()
                .any(|e| e.severity == GrammarSeverity::Moderate)
            {
                JudgeDecision::CorrectAndRetry
            } else {
                // Only minor errors remain; advance, optionally with a gentle
                // correction in the tutor instruction.
                JudgeDecision::Advance
            }
        }
    }
}

pub struct JudgeAgent {
    inference: Arc<dyn InferenceClient>,
    system: String,
    instructions: String,
}

impl JudgeAgent {
    pub const NAME: &'static str = "judge";

    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            inference,
            system: JUDGE_SYSTEM_CONTEXT.to_string(),
            instructions: JUDGE_AGENT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt configuration.
    pub fn with_prompts(mut self, system: String, instructions: String) -> Self {
        self.system = system;
        self.instructions = instructions;
        self
    }

    /// Produces the final decision. The returned decision and
    /// `should_advance` always follow the priority table, regardless of what
    /// the inference service answered.
    pub async fn process(&self, input: &JudgeInput) -> AgentReport<JudgeAgentOutput> {
        let started = Instant::now();
        let decision = decision_for(&input.grammar_analysis, &input.verifier_analysis);

        match self.synthesize(input, decision).await {
            Ok(mut data) => {
                if data.decision != decision {
                    warn!(
                        agent = Self::NAME,
                        model_decision = ?data.decision,
                        policy_decision = ?decision,
                        "inference disagreed with the decision policy, coercing"
                    );
                    data.decision = decision;
                }
                data.should_advance = decision == JudgeDecision::Advance;
                if decision == JudgeDecision::Ignore {
                    // An ignored turn is never spoken.
                    data.tutor_instruction.clear();
                }
                AgentReport {
                    success: true,
                    agent_name: Self::NAME,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    data,
                }
            }
            Err(error) => {
                warn!(agent = Self::NAME, %error, "agent failed, using fallback");
                AgentReport {
                    success: false,
                    agent_name: Self::NAME,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    data: JudgeAgentOutput::fallback(),
                }
            }
        }
    }

    async fn synthesize(
        &self,
        input: &JudgeInput,
        decision: JudgeDecision,
    ) -> Result<JudgeAgentOutput> {
        let user = format!(
            "{}\n\nMake a decision based on these analyses:\n\nTranscription: \"{}\"\nCurrent Question: \"{}\"\n\nRequired decision: {}\n\nGrammar Analysis:\n{}\n\nVerifier Analysis:\n{}\n\nRespond with valid JSON only.",
            self.instructions,
            input.analysis.transcription,
            input.analysis.current_question,
            serde_json::to_string(&decision)?,
            serde_json::to_string_pretty(&input.grammar_analysis)?,
            serde_json::to_string_pretty(&input.verifier_analysis)?,
        );
        let raw = self.inference.complete_json(&self.system, &user).await?;
        serde_json::from_str(&raw).context("judge agent returned malformed JSON")
    }
}
