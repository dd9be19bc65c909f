use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::identity::repo_types::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub fullname: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<Date>,
    pub skills: Option<Vec<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub fullname: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<Date>,
    pub skills: Vec<String>,
    pub role: String,
    pub avatar_id: Option<Uuid>,
    pub verified: bool,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl PublicUser {
    pub fn from_parts(user: User, role: String) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            lastname: user.lastname,
            fullname: user.fullname,
            country: user.country,
            birthdate: user.birthdate,
            skills: user.skills,
            role,
            avatar_id: user.avatar_id,
            verified: user.verified,
            completed: user.completed,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploaded {
    pub avatar_id: Uuid,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn public_user_uses_camel_case_keys() {
        let user = User {
            id: Uuid::new_v4(),
            provider_id: "provider|1".into(),
            username: "marta".into(),
            email: "marta@example.com".into(),
            name: Some("Marta".into()),
            lastname: Some("Nilsen".into()),
            fullname: Some("Marta Nilsen".into()),
            country: Some("NO".into()),
            birthdate: Some(date!(1990 - 04 - 02)),
            skills: vec!["rust".into()],
            role_id: Uuid::new_v4(),
            avatar_id: None,
            verified: true,
            completed: false,
            created_at: datetime!(2024-01-01 00:00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00:00 UTC),
        };
        let json = serde_json::to_value(PublicUser::from_parts(user, "MENTOR".into()))
            .expect("serialize");
        assert_eq!(json["role"], "MENTOR");
        assert!(json.get("avatarId").is_some());
        assert!(json.get("createdAt").is_some());
        // dates go out as day strings, not a serialized (year, ordinal) pair
        assert_eq!(json["birthdate"], "1990-04-02");
        // provider subject never leaves the directory
        assert!(json.get("providerId").is_none());
    }

    #[test]
    fn update_request_takes_iso_birthdate() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"birthdate": "1990-04-02"}"#).expect("parse");
        assert_eq!(req.birthdate, Some(date!(1990 - 04 - 02)));
        assert!(req.name.is_none());
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").expect("parse");
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);
    }
}
