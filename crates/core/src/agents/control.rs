//! Control Agent
//!
//! Enforces platform policy on both the student's input and the tutor's
//! proposed response. Acts as the guardrail on each side of the conversation
//! agent. Purely rule-based; no inference call.

use crate::agents::types::{AgentInput, AgentReport, ControlData};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

static SENSITIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bphone\s*number",
        r"(?i)credit\s*card",
        r"(?i)social\s*security",
        r"(?i)home\s*address",
        r"(?i)password",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid sensitive-content pattern"))
    .collect()
});

#[derive(Default)]
pub struct ControlAgent;

impl ControlAgent {
    pub const NAME: &'static str = "control";

    pub fn new() -> Self {
        Self
    }

    pub async fn process(&self, input: &AgentInput) -> AgentReport<ControlData> {
        let started = Instant::now();
        let data = self.enforce_rules(&input.user_message);
        AgentReport {
            success: true,
            agent_name: Self::NAME,
            processing_time_ms: started.elapsed().as_millis() as u64,
            data,
        }
    }

    fn enforce_rules(&self, message: &str) -> ControlData {
        let mut violations = Vec::new();

        if SENSITIVE_PATTERNS.iter().any(|p| p.is_match(message)) {
            violations.push("PERSONAL_INFO_REQUEST".to_string());
        }

        let allowed = violations.is_empty();
        ControlData {
            allowed,
            reason: (!allowed).then(|| "Content violates platform rules".to_string()),
            suggested_action: (!allowed)
                .then(|| "Please stay on topic with the lesson".to_string()),
            violations,
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
                language: Language::En,
                metadata: None,
            },
        }
    }

    #[tokio::test]
    async fn allows_lesson_talk() {
        let report = ControlAgent::new().process(&input("Do you like to cook?")).await;
        assert!(report.data.allowed);
        assert!(report.data.violations.is_empty());
        assert!(report.data.reason.is_none());
    }

    #[tokio::test]
    async fn blocks_personal_info_requests() {
        let report = ControlAgent::new()
            .process(&input("What is your credit card number?"))
            .await;
        assert!(!report.data.allowed);
        assert_eq!(report.data.violations, vec!["PERSONAL_INFO_REQUEST"]);
        assert!(report.data.suggested_action.is_some());
    }

    #[tokio::test]
    async fn telephone_question_from_catalog_is_not_blocked() {
        // "What is your telephone number?" is a catalog question; only the
        // standalone "phone number" phrasing trips the personal-info rule.
        let report = ControlAgent::new()
            .process(&input("What is your telephone number?"))
            .await;
        assert!(report.data.allowed);
    }
}
