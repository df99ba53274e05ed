//! Validation Agent
//!
//! Validates user input for correctness and safety before any other agent
//! sees it. Purely rule-based; no inference call.

use crate::agents::types::{AgentInput, AgentReport, ValidationData, ValidationIssue};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

/// Inputs longer than this are rejected outright.
const MAX_MESSAGE_LENGTH: usize = 2000;

static HARMFUL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bkill\s+yourself\b",
        r"(?i)\bhow\s+to\s+make\s+a\s+bomb\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid harmful-content pattern"))
    .collect()
});

#[derive(Default)]
pub struct ValidationAgent;

impl ValidationAgent {
    pub const NAME: &'static str = "validation";

    pub fn new() -> Self {
        Self
    }

    pub async fn process(&self, input: &AgentInput) -> AgentReport<ValidationData> {
        let started = Instant::now();
        let data = self.validate(&input.user_message);
        AgentReport {
            success: true,
            agent_name: Self::NAME,
            processing_time_ms: started.elapsed().as_millis() as u64,
            data,
        }
    }

    fn validate(&self, message: &str) -> ValidationData {
        let mut errors = Vec::new();

        if message.trim().is_empty() {
            errors.push(ValidationIssue {
                code: "EMPTY_INPUT".into(),
                message: "Message cannot be empty".into(),
                field: None,
            });
        }

        if message.chars().count() > MAX_MESSAGE_LENGTH {
            errors.push(ValidationIssue {
                code: "TOO_LONG".into(),
                message: "Message exceeds maximum length".into(),
                field: None,
            });
        }

        if HARMFUL_PATTERNS.iter().any(|p| p.is_match(message)) {
            errors.push(ValidationIssue {
                code: "HARMFUL_CONTENT".into(),
                message: "Message contains inappropriate content".into(),
                field: None,
            });
        }

        ValidationData {
            is_valid: errors.is_empty(),
            errors,
            sanitized_input: Some(message.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::{AgentContext, Language};

    fn input(message: &str) -> AgentInput {
        AgentInput {
            user_message: message.into(),
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
    async fn accepts_normal_message() {
        let report = ValidationAgent::new().process(&input("I like to cook")).await;
        assert!(report.success);
        assert!(report.data.is_valid);
        assert_eq!(report.data.sanitized_input.as_deref(), Some("I like to cook"));
    }

    #[tokio::test]
    async fn rejects_empty_message() {
        let report = ValidationAgent::new().process(&input("   ")).await;
        assert!(!report.data.is_valid);
        assert_eq!(report.data.errors[0].code, "EMPTY_INPUT");
    }

    #[tokio::test]
    async fn rejects_oversized_message() {
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        let report = ValidationAgent::new().process(&input(&long)).await;
        assert!(!report.data.is_valid);
        assert!(report.data.errors.iter().any(|e| e.code == "TOO_LONG"));
    }

    #[tokio::test]
    async fn sanitizes_whitespace() {
        let report = ValidationAgent::new().process(&input("  hola  ")).await;
        assert_eq!(report.data.sanitized_input.as_deref(), Some("hola"));
    }
}
