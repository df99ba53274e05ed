//! Analysis Orchestrator
//!
//! Coordinates the multi-agent analysis flow for one student utterance:
//! grammar and verifier run concurrently, the judge synthesizes their outputs
//! into a single decision. Total latency is therefore
//! max(grammar, verifier) + judge, not the sum.

use crate::agents::analysis::{
    AnalysisAgentName, AnalysisInput, GrammarAgentOutput, JudgeAgentOutput, JudgeDecision,
    JudgeInput, VerifierAgentOutput,
};
use crate::agents::{GrammarAgent, JudgeAgent, VerifierAgent};
use crate::inference::InferenceClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Utterances shorter than this are non-events, not errors: the orchestrator
/// answers `ignore` without invoking any agent.
const MIN_TRANSCRIPTION_CHARS: usize = 2;

/// Raw agent payloads, attached only when the caller asks for them. Additive:
/// never affects the decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDebug {
    pub grammar_result: GrammarAgentOutput,
    pub verifier_result: VerifierAgentOutput,
    pub judge_result: JudgeAgentOutput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOrchestratorOutput {
    pub success: bool,
    pub decision: JudgeDecision,
    pub should_advance: bool,
    pub tutor_instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_feedback: Option<String>,
    pub processing_time_ms: u64,
    pub agents_invoked: Vec<AnalysisAgentName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<AnalysisDebug>,
}

pub struct AnalysisOrchestrator {
    grammar: GrammarAgent,
    verifier: VerifierAgent,
    judge: JudgeAgent,
}

impl AnalysisOrchestrator {
    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            grammar: GrammarAgent::new(inference.clone()),
            verifier: VerifierAgent::new(inference.clone()),
            judge: JudgeAgent::new(inference),
        }
    }

    /// Evaluates one student utterance and returns the pedagogical decision.
    /// Never fails: agent failures degrade inside the agents, and the output
    /// always carries a usable decision.
    #[instrument(name = "analysis", skip_all, fields(session_id = %input.session_id, question_index = input.question_index))]
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        include_debug: bool,
    ) -> AnalysisOrchestratorOutput {
        let started = Instant::now();

        if input.transcription.trim().chars().count() < MIN_TRANSCRIPTION_CHARS {
            return AnalysisOrchestratorOutput {
                success: true,
                decision: JudgeDecision::Ignore,
                should_advance: false,
                tutor_instruction: String::new(),
                grammar_feedback: None,
                processing_time_ms: started.elapsed().as_millis() as u64,
                agents_invoked: vec![],
                debug: None,
            };
        }

        // Grammar and verifier only depend on the shared input, so they are
        // issued together and joined before the judge runs.
        let (grammar, verifier) = futures::join!(
            self.grammar.process(input),
            self.verifier.process(input)
        );
        let mut agents_invoked = vec![AnalysisAgentName::Grammar, AnalysisAgentName::Verifier];

        info!(
            assessment = ?grammar.data.overall_assessment,
            response_type = ?verifier.data.response_type,
            "analysis agents completed"
        );

        let judge_input = JudgeInput {
            analysis: input.clone(),
            grammar_analysis: grammar.data.clone(),
            verifier_analysis: verifier.data.clone(),
        };
        let judge = self.judge.process(&judge_input).await;
        agents_invoked.push(AnalysisAgentName::Judge);

        info!(
            decision = ?judge.data.decision,
            confidence = judge.data.confidence,
            "judge decision"
        );

        AnalysisOrchestratorOutput {
            success: judge.success,
            decision: judge.data.decision,
            should_advance: judge.data.should_advance,
            tutor_instruction: judge.data.tutor_instruction.clone(),
            grammar_feedback: judge.data.grammar_feedback.clone(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            agents_invoked,
            debug: include_debug.then(|| AnalysisDebug {
                grammar_result: grammar.data,
                verifier_result: verifier.data,
                judge_result: judge.data,
            }),
        }
    }
}
