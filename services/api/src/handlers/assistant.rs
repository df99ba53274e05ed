//! Handlers for realtime lesson sessions: allocation plus the
//! advancement check driven by the tutor's spoken transcript.

use super::ApiError;
use crate::models::{
    ErrorResponse, ProcessResponseRequest, ProcessResponseResponse, SimpleSessionParams,
    SimpleSessionResponse,
};
use crate::realtime::lesson2_tools;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use charla_core::agents::prompts::{LESSON2_LISTENER_PROMPT, SIMPLE_CONVERSATION_PROMPT};
use charla_core::questions;
use charla_core::session::AdvanceOutcome;
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::Arc;
use tracing::info;

fn new_session_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    format!("simple_{}_{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

/// Allocate a lesson session and mint a realtime transport token for it.
#[utoipa::path(
    get,
    path = "/api/assistant/simple-session",
    params(
        ("lesson" = Option<u32>, Query, description = "Lesson number (1 or 2)"),
        ("part" = Option<u32>, Query, description = "Lesson 2: starting part"),
        ("question" = Option<u32>, Query, description = "Lesson 2: question within the part"),
        ("initialQuestionIndex" = Option<u32>, Query, description = "Lesson 1: starting question index")
    ),
    responses(
        (status = 200, description = "Session allocated", body = SimpleSessionResponse),
        (status = 500, description = "Transport session could not be minted", body = ErrorResponse)
    )
)]
pub async fn simple_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimpleSessionParams>,
) -> Result<Json<SimpleSessionResponse>, ApiError> {
    let lesson = match params.lesson {
        Some(lesson) if (1..=2).contains(&lesson) => lesson,
        _ => 1,
    };
    let session_id = new_session_id();
    info!(session_id = %session_id, lesson, "allocating lesson session");

    if lesson == 2 {
        let part = params.part.unwrap_or(1);
        let question = params.question.unwrap_or(1);
        let session_state = state.store.get_or_create_part(&session_id, part, question);

        // Listener mode: the transport only transcribes and routes through
        // its declared tools; speech comes from the synthesis service.
        let minted = state
            .realtime
            .mint(LESSON2_LISTENER_PROMPT, true, Some(lesson2_tools()))
            .await?;

        Ok(Json(SimpleSessionResponse {
            token: minted.token,
            mode: "simple",
            lesson,
            session_id,
            current_question_index: None,
            part: Some(session_state.current_part),
            current_question_in_part: Some(session_state.current_question_in_part),
        }))
    } else {
        let initial_index = params.initial_question_index.unwrap_or(1);
        let session_state = state.store.get_or_create_simple(&session_id, initial_index);

        let instructions = format!(
            "{}{}",
            SIMPLE_CONVERSATION_PROMPT,
            questions::silent_context(session_state.current_question_index)
        );
        let minted = state.realtime.mint(&instructions, true, None).await?;

        Ok(Json(SimpleSessionResponse {
            token: minted.token,
            mode: "simple",
            lesson,
            session_id,
            current_question_index: Some(session_state.current_question_index),
            part: None,
            current_question_in_part: None,
        }))
    }
}

/// Process the tutor's spoken transcript for a session: detect which catalog
/// question was asked and advance when it is exactly the next one.
#[utoipa::path(
    post,
    path = "/api/assistant/simple-session/{session_id}/process-response",
    request_body = ProcessResponseRequest,
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Advancement outcome", body = ProcessResponseResponse),
        (status = 400, description = "Missing aiTranscript", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn process_response(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<ProcessResponseRequest>,
) -> Result<Json<ProcessResponseResponse>, ApiError> {
    let session = state
        .store
        .simple(&session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let current_index = session.current_question_index;

    // Language guardrail: during the translation block an English answer is
    // corrected without consulting the transcript matcher at all.
    if let Some(student) = body.student_transcript.as_deref()
        && questions::is_what_does_question(current_index)
        && questions::looks_like_english_answer(student)
    {
        return Ok(Json(ProcessResponseResponse {
            advanced: false,
            current_index,
            current_question: None,
            guardrail_triggered: Some(true),
            correction_instruction: Some("Responde en español, por favor.".to_string()),
        }));
    }

    let ai_transcript = body
        .ai_transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: aiTranscript".to_string()))?;

    let advanced = questions::find_question_index(&ai_transcript)
        .map(|detected| state.store.advance(&session_id, detected))
        .is_some_and(|outcome| matches!(outcome, AdvanceOutcome::Advanced { .. }));

    let current_index = state
        .store
        .simple(&session_id)
        .map(|s| s.current_question_index)
        .unwrap_or(current_index);

    info!(session_id = %session_id, advanced, current_index, "process-response");

    Ok(Json(ProcessResponseResponse {
        advanced,
        current_index,
        current_question: questions::question_by_index(current_index).map(str::to_string),
        guardrail_triggered: None,
        correction_instruction: None,
    }))
}
