//! API Models
//!
//! Wire types for the HTTP surface, shared between `serde` and the OpenAPI
//! documentation generated with `utoipa`. The protocol is camelCase JSON.

use charla_core::agents::analysis::JudgeDecision;
use charla_core::orchestrator::analysis::AnalysisDebug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/analysis/evaluate`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// The student's transcribed utterance.
    pub transcription: Option<String>,
    /// The question text, when the caller already knows it.
    pub current_question: Option<String>,
    /// 1-based question index into the lesson catalog.
    pub question_index: Option<u32>,
    pub lesson_number: Option<u32>,
    pub session_id: Option<String>,
    pub part_number: Option<u32>,
    pub question_in_part: Option<u32>,
    /// Attach raw agent payloads to the response.
    pub include_debug: Option<bool>,
}

/// Response body for `POST /api/analysis/evaluate`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub success: bool,
    #[schema(value_type = String, example = "advance")]
    pub decision: JudgeDecision,
    pub should_advance: bool,
    pub tutor_instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_feedback: Option<String>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub debug: Option<AnalysisDebug>,
}

/// Response body for `GET /api/analysis/health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub agents: Vec<&'static str>,
    pub timestamp: String,
}

/// Query parameters for `GET /api/assistant/simple-session`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSessionParams {
    /// Lesson number, 1 (single-track) or 2 (multi-part). Defaults to 1.
    pub lesson: Option<u32>,
    /// Multi-part lesson: part to start in.
    pub part: Option<u32>,
    /// Multi-part lesson: question within the part.
    pub question: Option<u32>,
    /// Single-track lesson: question index to seed the session with.
    pub initial_question_index: Option<u32>,
}

/// Response body for `GET /api/assistant/simple-session`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSessionResponse {
    /// Opaque bearer token for the realtime transport.
    pub token: String,
    #[schema(example = "simple")]
    pub mode: &'static str,
    pub lesson: u32,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_in_part: Option<u32>,
}

/// Request body for `POST /api/assistant/simple-session/{id}/process-response`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponseRequest {
    /// The tutor's spoken transcript, matched against the question catalog.
    pub ai_transcript: Option<String>,
    /// The student's transcript, checked by the language guardrail.
    pub student_transcript: Option<String>,
}

/// Response body for the process-response endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponseResponse {
    pub advanced: bool,
    pub current_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrail_triggered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction_instruction: Option<String>,
}

/// One history entry in a chat request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatHistoryEntry {
    #[schema(example = "user")]
    pub role: String,
    pub content: String,
}

/// Request body for `POST /api/chat/respond`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatHistoryEntry>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub lesson_id: Option<u32>,
    /// "en" or "es"; defaults to "es".
    pub language: Option<String>,
}

/// Response body for `POST /api/chat/respond`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub agents_invoked: Vec<String>,
    pub processing_time_ms: u64,
    pub validation_passed: bool,
    pub control_passed: bool,
    pub pedagogy_used: bool,
}

/// Request body for `POST /api/tts/speak`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SpeakRequest {
    pub text: Option<String>,
    #[schema(example = "nova")]
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

/// Error envelope for every failure response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}
