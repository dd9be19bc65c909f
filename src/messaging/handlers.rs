use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::EngineError,
    identity::extractors::AuthUser,
    messaging::{
        dto::{ConversationParams, ConversationSummary, SendMessageRequest},
        repo_types::DirectMessage,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/md", post(send_message).get(fetch_conversation))
        .route("/md/:user_id", get(list_summaries))
}

#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<DirectMessage>), EngineError> {
    let message = state
        .messaging
        .send_message(payload.sender_id, payload.receiver_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /md?senderId=&receiverId= returns the conversation oldest first and,
/// as a side effect, marks the counterpart's messages to the caller as read.
#[instrument(skip(state))]
pub async fn fetch_conversation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ConversationParams>,
) -> Result<Json<Vec<DirectMessage>>, EngineError> {
    let (sender_id, receiver_id) = params.ids();
    let history = state
        .messaging
        .fetch_conversation_marking_read(sender_id, receiver_id)
        .await?;
    Ok(Json(history))
}

#[instrument(skip(state))]
pub async fn list_summaries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ConversationSummary>>, EngineError> {
    let summaries = state.messaging.list_conversation_summaries(user_id).await?;
    Ok(Json(summaries))
}
