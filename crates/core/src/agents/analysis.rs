//! Contracts for the analysis chain (grammar, verifier, judge).

use serde::{Deserialize, Serialize};

/// The per-utterance input shared by the grammar and verifier agents.
/// Ephemeral: produced for one student utterance and dropped afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub transcription: String,
    pub current_question: String,
    pub question_index: u32,
    pub lesson_number: u32,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

/// Position inside a multi-part lesson, when applicable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_in_part: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarErrorType {
    Contraction,
    VerbForm,
    Article,
    Preposition,
    WordOrder,
    Tense,
    SubjectVerbAgreement,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrammarSeverity {
    Minor,
    Moderate,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarAssessment {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

/// One grammatical error the grammar agent found, with the correction and a
/// Spanish explanation for the learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarError {
    #[serde(rename = "type")]
    pub kind: GrammarErrorType,
    pub original: String,
    pub correction: String,
    pub explanation: String,
    pub severity: GrammarSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarAgentOutput {
    pub has_errors: bool,
    #[serde(default)]
    pub errors: Vec<GrammarError>,
    pub overall_assessment: GrammarAssessment,
    pub corrected_transcription: String,
    pub feedback_in_spanish: String,
}

impl GrammarAgentOutput {
    /// Conservative default used when the inference call fails: pretend the
    /// utterance was fine so a transient outage never blocks the student.
    pub fn fallback(transcription: &str) -> Self {
        Self {
            has_errors: false,
            errors: vec![],
            overall_assessment: GrammarAssessment::Good,
            corrected_transcription: transcription.to_string(),
            feedback_in_spanish: "No se pudo analizar la gramática.".to_string(),
        }
    }

    /// The worst severity among the reported errors, if any.
    pub fn max_severity(&self) -> Option<GrammarSeverity> {
        self.errors.iter().map(|e| e.severity).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    DirectAnswer,
    PartialAnswer,
    OffTopic,
    ClarificationNeeded,
    Noise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierAgentOutput {
    pub answers_question: bool,
    pub relevance_score: u8,
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_response_hint: Option<String>,
    pub analysis_reason: String,
}

impl VerifierAgentOutput {
    /// Conservative default used when the inference call fails: treat the
    /// utterance as noise so nothing advances on a broken analysis.
    pub fn fallback() -> Self {
        Self {
            answers_question: false,
            relevance_score: 0,
            response_type: ResponseType::Noise,
            expected_response_hint: None,
            analysis_reason: "Error analyzing response".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeDecision {
    Advance,
    CorrectAndRetry,
    ClarifyAndRetry,
    OffTopicRetry,
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeAgentOutput {
    pub decision: JudgeDecision,
    pub confidence: u8,
    pub should_advance: bool,
    pub tutor_instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_instruction_english: Option<String>,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_feedback: Option<String>,
}

impl JudgeAgentOutput {
    /// Default when the synthesis call fails: ignore the turn and apologize
    /// in the learner's language.
    pub fn fallback() -> Self {
        Self {
            decision: JudgeDecision::Ignore,
            confidence: 0,
            should_advance: false,
            tutor_instruction: "Lo siento, hubo un problema. Por favor, repite tu respuesta."
                .to_string(),
            tutor_instruction_english: None,
            reasoning: "Error in judge processing".to_string(),
            grammar_feedback: None,
        }
    }
}

/// Input to the judge: the original analysis input plus both analyses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeInput {
    #[serde(flatten)]
    pub analysis: AnalysisInput,
    pub grammar_analysis: GrammarAgentOutput,
    pub verifier_analysis: VerifierAgentOutput,
}

/// Names of the analysis-chain agents, as reported in orchestrator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisAgentName {
    Grammar,
    Verifier,
    Judge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&JudgeDecision::CorrectAndRetry).unwrap(),
            "\"correct_and_retry\""
        );
        assert_eq!(
            serde_json::from_str::<JudgeDecision>("\"off_topic_retry\"").unwrap(),
            JudgeDecision::OffTopicRetry
        );
    }

    #[test]
    fn grammar_output_parses_model_json() {
        let json = r#"{
            "hasErrors": true,
            "errors": [{
                "type": "word_order",
                "original": "I like play soccer",
                "correction": "I like to play soccer",
                "explanation": "Falta 'to' antes del verbo.",
                "severity": "moderate"
            }],
            "overallAssessment": "needs_improvement",
            "correctedTranscription": "I like to play soccer",
            "feedbackInSpanish": "Casi perfecto."
        }"#;
        let output: GrammarAgentOutput = serde_json::from_str(json).unwrap();
        assert!(output.has_errors);
        assert_eq!(output.errors[0].kind, GrammarErrorType::WordOrder);
        assert_eq!(output.max_severity(), Some(GrammarSeverity::Moderate));
    }

    #[test]
    fn severity_orders_minor_to_major() {
        assert!(GrammarSeverity::Minor < GrammarSeverity::Moderate);
        assert!(GrammarSeverity::Moderate < GrammarSeverity::Major);
    }

    #[test]
    fn verifier_fallback_is_noise() {
        let fallback = VerifierAgentOutput::fallback();
        assert_eq!(fallback.response_type, ResponseType::Noise);
        assert_eq!(fallback.relevance_score, 0);
        assert!(!fallback.answers_question);
    }

    #[test]
    fn judge_input_flattens_analysis_fields() {
        let input = JudgeInput {
            analysis: AnalysisInput {
                transcription: "yes".into(),
                current_question: "Do you like coffee?".into(),
                question_index: 3,
                lesson_number: 1,
                session_id: "s1".into(),
                metadata: None,
            },
            grammar_analysis: GrammarAgentOutput::fallback("yes"),
            verifier_analysis: VerifierAgentOutput::fallback(),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["transcription"], "yes");
        assert_eq!(json["grammarAnalysis"]["hasErrors"], false);
        assert_eq!(json["verifierAnalysis"]["responseType"], "noise");
    }
}
