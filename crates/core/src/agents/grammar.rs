//! Grammar Agent
//!
//! Analyzes grammatical errors in the student's transcribed speech, with a
//! focus on the mistakes Spanish speakers make when learning English.

use crate::agents::analysis::{AnalysisInput, GrammarAgentOutput};
use crate::agents::prompts::{GRAMMAR_AGENT_PROMPT, GRAMMAR_SYSTEM_CONTEXT};
use crate::agents::types::AgentReport;
use crate::inference::InferenceClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub struct GrammarAgent {
    inference: Arc<dyn InferenceClient>,
    system: String,
    instructions: String,
}

impl GrammarAgent {
    pub const NAME: &'static str = "grammar";

    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            inference,
            system: GRAMMAR_SYSTEM_CONTEXT.to_string(),
            instructions: GRAMMAR_AGENT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt configuration.
    pub fn with_prompts(mut self, system: String, instructions: String) -> Self {
        self.system = system;
        self.instructions = instructions;
        self
    }

    /// Analyzes one utterance. Never fails past this boundary: any inference
    /// or parse error becomes a `success: false` report with a payload that
    /// treats the utterance as grammatically fine.
    pub async fn process(&self, input: &AnalysisInput) -> AgentReport<GrammarAgentOutput> {
        let started = Instant::now();
        match self.analyze(input).await {
            Ok(data) => AgentReport {
                success: true,
                agent_name: Self::NAME,
                processing_time_ms: started.elapsed().as_millis() as u64,
                data,
            },
            Err(error) => {
                warn!(agent = Self::NAME, %error, "agent failed, using fallback");
                AgentReport {
                    success: false,
                    agent_name: Self::NAME,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    data: GrammarAgentOutput::fallback(&input.transcription),
                }
            }
        }
    }

    async fn analyze(&self, input: &AnalysisInput) -> Result<GrammarAgentOutput> {
        let user = format!(
            "{}\n\nAnalyze this response:\nTranscription: \"{}\"\nCurrent Question: \"{}\"\n\nRespond with valid JSON only.",
            self.instructions, input.transcription, input.current_question
        );
        let raw = self.inference.complete_json(&self.system, &user).await?;
        serde_json::from_str(&raw).context("grammar agent returned malformed JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::analysis::GrammarAssessment;
    use crate::inference::MockInferenceClient;
    use anyhow::anyhow;

    fn input() -> AnalysisInput {
        AnalysisInput {
            transcription: "I like play soccer".into(),
            current_question: "What do you like?".into(),
            question_index: 5,
            lesson_number: 1,
            session_id: "s1".into(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn parses_successful_analysis() {
        let mut inference = MockInferenceClient::new();
        inference.expect_complete_json().returning(|_, _| {
            Ok(r#"{
                "hasErrors": true,
                "errors": [{
                    "type": "word_order",
                    "original": "like play",
                    "correction": "like to play",
                    "explanation": "Falta 'to'.",
                    "severity": "moderate"
                }],
                "overallAssessment": "needs_improvement",
                "correctedTranscription": "I like to play soccer",
                "feedbackInSpanish": "Casi."
            }"#
            .to_string())
        });

        let agent = GrammarAgent::new(Arc::new(inference));
        let report = agent.process(&input()).await;
        assert!(report.success);
        assert_eq!(report.agent_name, "grammar");
        assert!(report.data.has_errors);
        assert_eq!(report.data.overall_assessment, GrammarAssessment::NeedsImprovement);
    }

    #[tokio::test]
    async fn inference_error_becomes_fallback() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete_json()
            .returning(|_, _| Err(anyhow!("timeout")));

        let agent = GrammarAgent::new(Arc::new(inference));
        let report = agent.process(&input()).await;
        assert!(!report.success);
        assert!(!report.data.has_errors);
        assert_eq!(report.data.corrected_transcription, "I like play soccer");
    }

    #[tokio::test]
    async fn malformed_json_becomes_fallback() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete_json()
            .returning(|_, _| Ok("not json at all".to_string()));

        let agent = GrammarAgent::new(Arc::new(inference));
        let report = agent.process(&input()).await;
        assert!(!report.success);
        assert_eq!(report.data.overall_assessment, GrammarAssessment::Good);
    }
}
