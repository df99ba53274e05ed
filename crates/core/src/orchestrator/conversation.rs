//! Conversation Orchestrator
//!
//! Drives the text-chat pipeline: validation → pre-control → conversation
//! (→ pedagogy when confidence is low) → post-control on the final response.

use crate::agents::types::{AgentInput, AgentKind, ConversationData, Language, PedagogyData};
use crate::agents::{ControlAgent, ConversationAgent, PedagogyAgent, ValidationAgent};
use crate::inference::InferenceClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Below this conversation-agent confidence the pedagogy agent is consulted
/// and its explanation merged into the response.
const PEDAGOGY_CONFIDENCE_FLOOR: f32 = 0.7;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeMetadata {
    pub validation_passed: bool,
    pub control_passed: bool,
    pub pedagogy_used: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationOutcome {
    pub final_response: String,
    pub agents_invoked: Vec<AgentKind>,
    pub processing_time_ms: u64,
    pub metadata: OutcomeMetadata,
}

pub struct ConversationOrchestrator {
    validation: ValidationAgent,
    control: ControlAgent,
    conversation: ConversationAgent,
    pedagogy: PedagogyAgent,
}

impl ConversationOrchestrator {
    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self {
            validation: ValidationAgent::new(),
            control: ControlAgent::new(),
            conversation: ConversationAgent::new(inference.clone()),
            pedagogy: PedagogyAgent::new(inference),
        }
    }

    /// Processes one user message into a single user-facing response plus
    /// metadata about which agents fired. Never fails.
    #[instrument(name = "conversation", skip_all)]
    pub async fn process(&self, input: &AgentInput) -> ConversationOutcome {
        let started = Instant::now();
        let mut agents_invoked = vec![AgentKind::Validation];

        let validation = self.validation.process(input).await;
        if !validation.data.is_valid {
            let message = validation
                .data
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(". ");
            return ConversationOutcome {
                final_response: message,
                agents_invoked,
                processing_time_ms: started.elapsed().as_millis() as u64,
                metadata: OutcomeMetadata {
                    validation_passed: false,
                    control_passed: true,
                    pedagogy_used: false,
                },
            };
        }

        agents_invoked.push(AgentKind::Control);
        let pre_control = self.control.process(input).await;
        if !pre_control.data.allowed {
            let message = pre_control
                .data
                .suggested_action
                .unwrap_or_else(|| "Request not allowed".to_string());
            return ConversationOutcome {
                final_response: message,
                agents_invoked,
                processing_time_ms: started.elapsed().as_millis() as u64,
                metadata: OutcomeMetadata {
                    validation_passed: true,
                    control_passed: false,
                    pedagogy_used: false,
                },
            };
        }

        agents_invoked.push(AgentKind::Conversation);
        let conversation = self.conversation.process(input).await;

        let mut pedagogy_used = false;
        let mut final_response = conversation.data.response.clone();

        if conversation.data.confidence < PEDAGOGY_CONFIDENCE_FLOOR {
            agents_invoked.push(AgentKind::Pedagogy);
            pedagogy_used = true;
            let pedagogy = self.pedagogy.process(input).await;
            final_response = enhance_with_pedagogy(&conversation.data, &pedagogy.data);
        }

        // Check the response we are about to speak, not the user's input.
        let post_control_input = AgentInput {
            user_message: final_response.clone(),
            conversation_history: input.conversation_history.clone(),
            context: input.context.clone(),
        };
        let post_control = self.control.process(&post_control_input).await;
        if !post_control.data.allowed {
            final_response = safe_response(input.context.language).to_string();
        }

        info!(
            agents = agents_invoked.len(),
            pedagogy_used,
            control_passed = post_control.data.allowed,
            "conversation turn complete"
        );

        ConversationOutcome {
            final_response,
            agents_invoked,
            processing_time_ms: started.elapsed().as_millis() as u64,
            metadata: OutcomeMetadata {
                validation_passed: true,
                control_passed: post_control.data.allowed,
                pedagogy_used,
            },
        }
    }
}

fn enhance_with_pedagogy(conversation: &ConversationData, pedagogy: &PedagogyData) -> String {
    let mut enhanced = conversation.response.clone();
    if !pedagogy.explanation.is_empty() {
        enhanced.push_str("\n\n");
        enhanced.push_str(&pedagogy.explanation);
    }
    if let Some(examples) = &pedagogy.examples
        && !examples.is_empty()
    {
        enhanced.push_str("\n\nExamples: ");
        enhanced.push_str(&examples.join(", "));
    }
    enhanced
}

fn safe_response(language: Language) -> &'static str {
    match language {
        Language::Es => "Lo siento, no puedo procesar esa solicitud. ¿Podemos continuar con la lección?",
        Language::En => "I'm sorry, I can't process that request. Can we continue with the lesson?",
    }
}
