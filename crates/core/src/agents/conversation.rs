//! Conversation Agent
//!
//! Generates the tutoring reply for a validated user message. Backed by the
//! inference service; degrades to a canned per-language reply on failure.

use crate::agents::prompts::{CONVERSATION_AGENT_PROMPT, CONVERSATION_SYSTEM_CONTEXT};
use crate::agents::types::{AgentInput, AgentReport, ConversationData, Language, Role};
use crate::inference::InferenceClient;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub struct ConversationAgent {
    inference: Arc<dyn InferenceClient>,
    system: String,
    instructions: String,
}

impl ConversationAgent {
    pub const NAME: &'static str = "conversation";

    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            inference,
            system: CONVERSATION_SYSTEM_CONTEXT.to_string(),
            instructions: CONVERSATION_AGENT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt configuration.
    pub fn with_prompts(mut self, system: String, instructions: String) -> Self {
        self.system = system;
        self.instructions = instructions;
        self
    }

    pub async fn process(&self, input: &AgentInput) -> AgentReport<ConversationData> {
        let started = Instant::now();
        match self.generate(input).await {
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
                    data: fallback_reply(input.context.language),
                }
            }
        }
    }

    async fn generate(&self, input: &AgentInput) -> Result<ConversationData> {
        let raw = self
            .inference
            .complete_json(&self.system, &self.render_user_message(input))
            .await?;
        serde_json::from_str(&raw).context("conversation agent returned malformed JSON")
    }

    fn render_user_message(&self, input: &AgentInput) -> String {
        let mut user = format!("{}\n\nConversation so far:\n", self.instructions);
        for message in &input.conversation_history {
            let speaker = match message.role {
                Role::User => "Student",
                Role::Assistant => "Tutor",
                Role::System => "System",
            };
            let _ = writeln!(user, "{}: {}", speaker, message.content);
        }
        let _ = write!(
            user,
            "\nStudent's new message: \"{}\"\n\nRespond with valid JSON only.",
            input.user_message
        );
        user
    }
}

fn fallback_reply(language: Language) -> ConversationData {
    let response = match language {
        Language::Es => "Tengo problemas para responder en este momento. Por favor, intenta de nuevo.",
        Language::En => "I'm having trouble responding right now. Please try again.",
    };
    ConversationData {
        response: response.to_string(),
        suggested_follow_up: None,
        confidence: 0.0,
    }
}
