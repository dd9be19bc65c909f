use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Typed failure set for engine operations. Every engine method returns
/// `Result<T, EngineError>`; handlers never see an untyped `{error, data}`
/// payload internally.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed input. No side effect has occurred.
    #[error("{0}")]
    Validation(String),

    /// A referenced user, match request, message or report does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write (match pair, email, username).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Wire envelope every failure is rendered into.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: bool,
    pub data: String,
}

impl EngineError {
    /// Client-caused failures all surface as 404 on this API; only
    /// infrastructure failures are 5xx.
    fn status(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) | EngineError::NotFound(_) | EngineError::Conflict(_) => {
                StatusCode::NOT_FOUND
            }
            EngineError::Database(_) | EngineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let data = match &self {
            EngineError::Database(e) => {
                error!(error = %e, "database error");
                "internal error".to_string()
            }
            EngineError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: true, data })).into_response()
    }
}

/// Maps a unique-index rejection to `Conflict` with the given message and
/// leaves every other database error untouched. The unique index, not
/// application-level locking, resolves racing writers.
pub fn conflict_on_unique(e: sqlx::Error, msg: &str) -> EngineError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            EngineError::Conflict(msg.to_string())
        }
        _ => EngineError::Database(e),
    }
}

#[cfg(test)]
mod envelope_tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn client_failures_map_to_404_with_envelope() {
        for err in [
            EngineError::Validation("missing sender id".into()),
            EngineError::NotFound("user does not exist".into()),
            EngineError::Conflict("match request already exists".into()),
        ] {
            let msg = err.to_string();
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body = body_json(resp).await;
            assert_eq!(body["error"], serde_json::json!(true));
            assert_eq!(body["data"], serde_json::json!(msg));
        }
    }

    #[tokio::test]
    async fn infrastructure_failures_map_to_500_without_detail() {
        let resp = EngineError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], serde_json::json!(true));
        assert_eq!(body["data"], serde_json::json!("internal error"));

        let resp = EngineError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_unique_database_errors_pass_through() {
        let err = conflict_on_unique(sqlx::Error::PoolClosed, "taken");
        assert!(matches!(err, EngineError::Database(_)));
    }

    /// Minimal driver error reporting a unique violation, shaped like the
    /// one Postgres hands back for a duplicate key.
    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let err = conflict_on_unique(
            sqlx::Error::Database(Box::new(DuplicateKey)),
            "match request already exists",
        );
        match err {
            EngineError::Conflict(msg) => assert_eq!(msg, "match request already exists"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }
}
