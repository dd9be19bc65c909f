use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    identity::{repo_types::User, verifier::TokenVerifier},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

/// GET /ws?token= upgrades to the caller's realtime channel. The browser
/// WebSocket API cannot set headers, so the credential rides in the query.
#[instrument(skip(state, params, ws))]
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": true, "data": "unauthorized"})),
        )
    };

    let subject = state
        .verifier
        .verify(&params.token)
        .await
        .map_err(|_| unauthorized())?;

    let user_id = match User::auth_lookup(&state.db, &subject).await {
        Ok(Some((id, _role))) => id,
        Ok(None) => return Err(unauthorized()),
        Err(e) => {
            warn!(error = %e, "auth lookup failed");
            return Err(unauthorized());
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(stream: WebSocket, state: AppState, user_id: Uuid) {
    let mut rx = state.fanout.register(user_id);
    let (mut sender, mut receiver) = stream.split();
    debug!(user_id = %user_id, "realtime channel open");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // slow clients skip missed events and stay connected
                    warn!(user_id = %user_id, skipped, "realtime receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                // client frames are ignored; messages are sent over REST
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    drop(rx);
    state.fanout.unregister(user_id);
    debug!(user_id = %user_id, "realtime channel closed");
}
