//! Axum Handlers
//!
//! Request handling for the analysis, assistant-session, chat, and TTS
//! endpoints. `utoipa` doc comments on each handler generate the OpenAPI
//! documentation.

pub mod analysis;
pub mod assistant;
pub mod chat;
pub mod tts;

use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
    /// Internal failure that still reports how long the request ran, as the
    /// evaluate endpoint's contract requires.
    InternalWithTiming {
        source: anyhow::Error,
        processing_time_ms: u64,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error,
                    processing_time_ms: None,
                }),
            )
                .into_response(),
            ApiError::NotFound(error) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error,
                    processing_time_ms: None,
                }),
            )
                .into_response(),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "An internal server error occurred.".to_string(),
                        processing_time_ms: None,
                    }),
                )
                    .into_response()
            }
            ApiError::InternalWithTiming {
                source,
                processing_time_ms,
            } => {
                error!("Internal Server Error: {:?}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: source.to_string(),
                        processing_time_ms: Some(processing_time_ms),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}
