//! Verifier Agent
//!
//! Checks whether the student's response semantically answers the current
//! question. Grammar is deliberately out of its scope.

use crate::agents::analysis::{AnalysisInput, VerifierAgentOutput};
use crate::agents::prompts::{VERIFIER_AGENT_PROMPT, VERIFIER_SYSTEM_CONTEXT};
use crate::agents::types::AgentReport;
use crate::inference::InferenceClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub struct VerifierAgent {
    inference: Arc<dyn InferenceClient>,
    system: String,
    instructions: String,
}

impl VerifierAgent {
    pub const NAME: &'static str = "verifier";

    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            inference,
            system: VERIFIER_SYSTEM_CONTEXT.to_string(),
            instructions: VERIFIER_AGENT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt configuration.
    pub fn with_prompts(mut self, system: String, instructions: String) -> Self {
        self.system = system;
        self.instructions = instructions;
        self
    }

    /// Classifies one utterance. Failures degrade to `noise` so a broken
    /// analysis can never advance the lesson.
    pub async fn process(&self, input: &AnalysisInput) -> AgentReport<VerifierAgentOutput> {
        let started = Instant::now();
        match self.classify(input).await {
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
                    data: VerifierAgentOutput::fallback(),
                }
            }
        }
    }

    async fn classify(&self, input: &AnalysisInput) -> Result<VerifierAgentOutput> {
        let user = format!(
            "{}\n\nAnalyze this response:\nTranscription: \"{}\"\nCurrent Question: \"{}\"\n\nRespond with valid JSON only.",
            self.instructions, input.transcription, input.current_question
        );
        let raw = self.inference.complete_json(&self.system, &user).await?;
        serde_json::from_str(&raw).context("verifier agent returned malformed JSON")
    }
}
