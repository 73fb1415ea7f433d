//! Chatbot endpoints

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};

use super::dto::{ApiResponse, ChatRequest};
use crate::AppState;
use crate::error::AppError;
use crate::service::{ChatReply, ChatService, ChatStatus};

/// Create chatbot router
///
/// Routes:
/// - POST /chatbot/chat - Ask the assistant
/// - GET /chatbot/status - Configuration and limiter state
pub fn chatbot_router() -> Router<AppState> {
    Router::new()
        .route("/chatbot/chat", post(chat))
        .route("/chatbot/status", get(status))
}

fn chat_service(state: &AppState) -> ChatService {
    ChatService::new(
        state.http_client.clone(),
        state.config.chatbot.clone(),
        state.chat_limiter.clone(),
    )
}

/// POST /chatbot/chat
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let Json(request) = payload?;
    let reply = chat_service(&state).chat(&request.message).await?;
    Ok(Json(ApiResponse::ok(reply)))
}

/// GET /chatbot/status
async fn status(State(state): State<AppState>) -> Json<ApiResponse<ChatStatus>> {
    Json(ApiResponse::ok(chat_service(&state).status().await))
}
