use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    identity::repo_types::UserSummary,
    matches::repo_types::{MatchRequest, MatchStatus},
};

/// Missing ids fall back to nil and are rejected by the engine, keeping the
/// error envelope uniform instead of surfacing a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMatchRequest {
    #[serde(default)]
    pub sender_id: Uuid,
    #[serde(default)]
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondMatchRequest {
    #[serde(default)]
    pub sender_id: Uuid,
    pub response: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchMessage {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResponded {
    pub message: String,
    pub status: MatchStatus,
}

/// Pending request with the other party's profile joined in.
#[derive(Debug, Serialize)]
pub struct PendingMatch {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub counterpart: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequests {
    pub sent_by_me: Vec<PendingMatch>,
    pub received_by_me: Vec<PendingMatch>,
}
