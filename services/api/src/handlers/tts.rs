//! Handler proxying text to the speech-synthesis service.

use super::ApiError;
use crate::models::{ErrorResponse, SpeakRequest};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use charla_core::tts::{DEFAULT_SPEED, DEFAULT_VOICE};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Synthesize speech for a piece of tutor text.
#[utoipa::path(
    post,
    path = "/api/tts/speak",
    request_body = SpeakRequest,
    responses(
        (status = 200, description = "MP3 audio", content_type = "audio/mpeg"),
        (status = 400, description = "Missing or invalid 'text' field", body = ErrorResponse),
        (status = 500, description = "Synthesis failed", body = ErrorResponse)
    )
)]
pub async fn speak(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeakRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let text = body
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing or invalid 'text' field".to_string()))?;

    let voice = body.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let speed = body.speed.unwrap_or(DEFAULT_SPEED);

    let audio = state
        .synthesizer
        .synthesize(&text, &voice, speed)
        .await
        .map_err(|source| ApiError::InternalWithTiming {
            source,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })?;

    info!(chars = text.len(), bytes = audio.len(), "speech synthesized");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        audio,
    )
        .into_response())
}
