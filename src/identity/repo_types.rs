use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Directory row. `provider_id` is the stable subject the identity provider
/// returns; `id` is what every other table references.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub provider_id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub fullname: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<Date>,
    pub skills: Vec<String>,
    pub role_id: Uuid,
    pub avatar_id: Option<Uuid>,
    pub verified: bool,
    pub completed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Avatar {
    pub id: Uuid,
    pub title: String,
    pub object_key: String,
}

/// Minimal profile exposed wherever a counterpart is joined in (connections,
/// pending requests, conversation summaries, reports).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub fullname: Option<String>,
    pub avatar_id: Option<Uuid>,
}
