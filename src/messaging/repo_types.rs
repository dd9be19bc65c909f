use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Immutable after creation except for `read`, which only ever flips
/// false -> true, in bulk, when the receiver opens the conversation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
