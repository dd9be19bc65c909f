use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{identity::repo_types::UserSummary, messaging::repo_types::DirectMessage};

/// Missing ids fall back to nil and are rejected by the engine, keeping the
/// error envelope uniform instead of surfacing a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: Uuid,
    #[serde(default)]
    pub receiver_id: Uuid,
    #[serde(default)]
    pub content: String,
}

/// Conversation ids arrive as query text. Blank or malformed values parse
/// to nil and fail the engine's validation, so a mangled query string still
/// answers in the error envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParams {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub receiver_id: String,
}

impl ConversationParams {
    pub fn ids(&self) -> (Uuid, Uuid) {
        (parse_or_nil(&self.sender_id), parse_or_nil(&self.receiver_id))
    }
}

fn parse_or_nil(raw: &str) -> Uuid {
    raw.trim().parse().unwrap_or(Uuid::nil())
}

/// One entry per counterpart: who, the latest message either way, and how
/// many of their messages the caller has not read yet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub contact: UserSummary,
    pub last_message: DirectMessage,
    pub unread_count: i64,
}
