//! Pedagogy Agent
//!
//! Explains language concepts and mistakes in learner-friendly terms. Fired
//! by the orchestrator when the conversation agent's confidence is low.

use crate::agents::prompts::{PEDAGOGY_AGENT_PROMPT, PEDAGOGY_SYSTEM_CONTEXT};
use crate::agents::types::{AgentInput, AgentReport, Difficulty, Language, PedagogyData};
use crate::inference::InferenceClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub struct PedagogyAgent {
    inference: Arc<dyn InferenceClient>,
    system: String,
    instructions: String,
}

impl PedagogyAgent {
    pub const NAME: &'static str = "pedagogy";

    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            inference,
            system: PEDAGOGY_SYSTEM_CONTEXT.to_string(),
            instructions: PEDAGOGY_AGENT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt configuration.
    pub fn with_prompts(mut self, system: String, instructions: String) -> Self {
        self.system = system;
        self.instructions = instructions;
        self
    }

    pub async fn process(&self, input: &AgentInput) -> AgentReport<PedagogyData> {
        let started = Instant::now();
        match self.explain(input).await {
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
                    data: fallback_explanation(input.context.language),
                }
            }
        }
    }

    async fn explain(&self, input: &AgentInput) -> Result<PedagogyData> {
        let user = format!(
            "{}\n\nStudent's message: \"{}\"\n\nRespond with valid JSON only.",
            self.instructions, input.user_message
        );
        let raw = self.inference.complete_json(&self.system, &user).await?;
        serde_json::from_str(&raw).context("pedagogy agent returned malformed JSON")
    }
}

fn fallback_explanation(language: Language) -> PedagogyData {
    let explanation = match language {
        Language::Es => "No puedo dar una explicación en este momento.",
        Language::En => "Unable to provide explanation at this time.",
    };
    PedagogyData {
        explanation: explanation.to_string(),
        concept: None,
        examples: None,
        difficulty: Difficulty::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::AgentContext;
    use crate::inference::MockInferenceClient;
    use anyhow::anyhow;

    fn input() -> AgentInput {
        AgentInput {
            user_message: "I no like coffee".into(),
            conversation_history: vec![],
            context: AgentContext {
                user_id: None,
                lesson_id: None,
                current_step: None,
                language: Language::Es,
                metadata: None,
            },
        }
    }

    #[tokio::test]
    async fn returns_explanation_with_examples() {
        let mut inference = MockInferenceClient::new();
        inference.expect_complete_json().returning(|_, _| {
            Ok(r#"{
                "explanation": "En inglés se necesita 'do not' para negar.",
                "concept": "Auxiliares negativos",
                "examples": ["I do not like coffee", "She does not like tea"],
                "difficulty": "easy"
            }"#
            .to_string())
        });

        let agent = PedagogyAgent::new(Arc::new(inference));
        let report = agent.process(&input()).await;
        assert!(report.success);
        assert_eq!(report.data.difficulty, Difficulty::Easy);
        assert_eq!(report.data.examples.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failure_uses_fallback() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete_json()
            .returning(|_, _| Err(anyhow!("boom")));

        let agent = PedagogyAgent::new(Arc::new(inference));
        let report = agent.process(&input()).await;
        assert!(!report.success);
        assert_eq!(report.data.difficulty, Difficulty::Medium);
        assert!(report.data.explanation.contains("explicación"));
    }
}
