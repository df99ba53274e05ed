//! Handler for the text-chat conversation pipeline.

use super::ApiError;
use crate::models::{ChatRequest, ChatResponse, ErrorResponse};
use crate::state::AppState;
use axum::{extract::State, response::Json};
use charla_core::agents::types::{
    AgentContext, AgentInput, ConversationMessage, Language, Role,
};
use std::sync::Arc;
use uuid::Uuid;

fn parse_role(raw: &str) -> Role {
    match raw {
        "assistant" | "ai" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

/// Run one user message through the conversation orchestrator.
#[utoipa::path(
    post,
    path = "/api/chat/respond",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Tutor response", body = ChatResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let language = match body.language.as_deref() {
        Some("en") => Language::En,
        _ => Language::Es,
    };

    let input = AgentInput {
        user_message: body.message.clone(),
        conversation_history: body
            .history
            .iter()
            .map(|entry| ConversationMessage {
                role: parse_role(&entry.role),
                content: entry.content.clone(),
                timestamp: None,
            })
            .collect(),
        context: AgentContext {
            user_id: body.user_id,
            lesson_id: body.lesson_id,
            current_step: None,
            language,
            metadata: None,
        },
    };

    let outcome = state.conversation.process(&input).await;

    // Persist the turn; the chat surface reloads history from this store.
    let session_id = body
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    state.history.append(&session_id, Role::User, &body.message).await?;
    state
        .history
        .append(&session_id, Role::Assistant, &outcome.final_response)
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.final_response,
        agents_invoked: outcome
            .agents_invoked
            .iter()
            .map(|kind| format!("{kind:?}").to_lowercase())
            .collect(),
        processing_time_ms: outcome.processing_time_ms,
        validation_passed: outcome.metadata.validation_passed,
        control_passed: outcome.metadata.control_passed,
        pedagogy_used: outcome.metadata.pedagogy_used,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::test_state;
    use crate::models::ChatHistoryEntry;

    #[tokio::test]
    async fn empty_message_fails_validation_but_responds() {
        let state = test_state();
        let Json(response) = respond(
            State(state),
            Json(ChatRequest {
                message: "".into(),
                history: vec![],
                session_id: None,
                user_id: None,
                lesson_id: None,
                language: Some("en".into()),
            }),
        )
        .await
        .unwrap();

        assert!(!response.validation_passed);
        assert_eq!(response.response, "Message cannot be empty");
        assert_eq!(response.agents_invoked, vec!["validation"]);
    }

    #[tokio::test]
    async fn turn_is_appended_to_history() {
        let state = test_state();
        let Json(_) = respond(
            State(state.clone()),
            Json(ChatRequest {
                message: "I like to cook".into(),
                history: vec![ChatHistoryEntry {
                    role: "assistant".into(),
                    content: "Do you like to cook?".into(),
                }],
                session_id: Some("chat-1".into()),
                user_id: Some("u1".into()),
                lesson_id: Some(1),
                language: Some("es".into()),
            }),
        )
        .await
        .unwrap();

        let messages = state.history.messages("chat-1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "I like to cook");
        assert_eq!(messages[1].role, Role::Assistant);
    }
}
