use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::EngineError,
    identity::{extractors::AuthUser, repo_types::UserSummary},
    matches::{
        dto::{MatchMessage, MatchResponded, PendingRequests, RespondMatchRequest, SendMatchRequest},
        repo_types::MatchStatus,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches", post(send_match))
        .route("/matches/:id", get(list_connections).patch(respond_match))
        .route("/matches/req/:id", get(list_pending))
}

#[instrument(skip(state, payload))]
pub async fn send_match(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<SendMatchRequest>,
) -> Result<Json<MatchMessage>, EngineError> {
    state
        .matches
        .request_match(payload.sender_id, payload.receiver_id)
        .await?;
    Ok(Json(MatchMessage {
        message: "match request sent".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn respond_match(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(receiver_id): Path<Uuid>,
    Json(payload): Json<RespondMatchRequest>,
) -> Result<Json<MatchResponded>, EngineError> {
    let status = state
        .matches
        .respond_to_match(receiver_id, payload.sender_id, payload.response)
        .await?;
    let message = match status {
        MatchStatus::Accepted => "match accepted",
        _ => "match rejected",
    };
    Ok(Json(MatchResponded {
        message: message.into(),
        status,
    }))
}

#[instrument(skip(state))]
pub async fn list_connections(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserSummary>>, EngineError> {
    let connections = state.matches.list_connections(id).await?;
    Ok(Json(connections))
}

#[instrument(skip(state))]
pub async fn list_pending(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PendingRequests>, EngineError> {
    let pending = state.matches.list_pending(id).await?;
    Ok(Json(pending))
}
