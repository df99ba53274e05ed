//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and the OpenAPI documentation.

use crate::{
    handlers::{analysis, assistant, chat, tts},
    models::{
        ChatHistoryEntry, ChatRequest, ChatResponse, ErrorResponse, EvaluateRequest,
        EvaluateResponse, HealthResponse, ProcessResponseRequest, ProcessResponseResponse,
        SimpleSessionParams, SimpleSessionResponse, SpeakRequest,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        analysis::evaluate,
        analysis::health,
        assistant::simple_session,
        assistant::process_response,
        chat::respond,
        tts::speak,
    ),
    components(
        schemas(
            EvaluateRequest, EvaluateResponse, HealthResponse,
            SimpleSessionParams, SimpleSessionResponse,
            ProcessResponseRequest, ProcessResponseResponse,
            ChatRequest, ChatResponse, ChatHistoryEntry,
            SpeakRequest, ErrorResponse,
        )
    ),
    tags(
        (name = "Charla API", description = "Multi-agent evaluation and lesson sessions for the conversation tutor")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/api/analysis/evaluate", post(analysis::evaluate))
        .route("/api/analysis/health", get(analysis::health))
        .route("/api/assistant/simple-session", get(assistant::simple_session))
        .route(
            "/api/assistant/simple-session/{session_id}/process-response",
            post(assistant::process_response),
        )
        .route("/api/chat/respond", post(chat::respond))
        .route("/api/tts/speak", post(tts::speak))
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
