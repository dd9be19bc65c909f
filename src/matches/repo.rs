use sqlx::PgPool;
use uuid::Uuid;

use crate::matches::repo_types::MatchRequest;

impl MatchRequest {
    /// The unique index on (sender_id, receiver_id) is the arbiter when two
    /// requests for the same ordered pair race; the loser gets a unique
    /// violation back.
    pub async fn insert(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> sqlx::Result<MatchRequest> {
        sqlx::query_as::<_, MatchRequest>(
            r#"
            INSERT INTO match_requests (sender_id, receiver_id)
            VALUES ($1, $2)
            RETURNING id, sender_id, receiver_id, status, created_at, updated_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(db)
        .await
    }

    /// pending -> accepted in one statement. `None` when there is no pending
    /// row for the pair, including when a concurrent responder got there
    /// first.
    pub async fn accept(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> sqlx::Result<Option<MatchRequest>> {
        sqlx::query_as::<_, MatchRequest>(
            r#"
            UPDATE match_requests
            SET status = 'accepted', updated_at = now()
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'pending'
            RETURNING id, sender_id, receiver_id, status, created_at, updated_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(db)
        .await
    }

    /// A rejection removes the row entirely so the same pair can request
    /// again later.
    pub async fn delete_pending(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM match_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Accepted rows with the user on either side. No ORDER BY: callers get
    /// whatever order the scan produces.
    pub async fn list_accepted_for(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<MatchRequest>> {
        sqlx::query_as::<_, MatchRequest>(
            r#"
            SELECT id, sender_id, receiver_id, status, created_at, updated_at
            FROM match_requests
            WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_pending_for(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<MatchRequest>> {
        sqlx::query_as::<_, MatchRequest>(
            r#"
            SELECT id, sender_id, receiver_id, status, created_at, updated_at
            FROM match_requests
            WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod pair_index_tests {
    use super::*;
    use crate::error::{conflict_on_unique, EngineError};

    /// Runs only when DATABASE_URL names a reachable Postgres; the schema is
    /// brought up to date first. Random ids keep runs independent.
    async fn live_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        sqlx::migrate!("./migrations").run(&pool).await.ok()?;
        Some(pool)
    }

    #[tokio::test]
    async fn duplicate_ordered_pair_surfaces_as_conflict() {
        let Some(db) = live_pool().await else { return };
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();

        MatchRequest::insert(&db, sender, receiver)
            .await
            .expect("first insert");
        let err = MatchRequest::insert(&db, sender, receiver)
            .await
            .expect_err("ordered pair is unique");
        match conflict_on_unique(err, "match request already exists") {
            EngineError::Conflict(msg) => assert_eq!(msg, "match request already exists"),
            other => panic!("expected Conflict, got {other:?}"),
        }

        // The mirrored pair is a different row.
        MatchRequest::insert(&db, receiver, sender)
            .await
            .expect("reverse insert");

        sqlx::query("DELETE FROM match_requests WHERE sender_id = $1 OR receiver_id = $1")
            .bind(sender)
            .execute(&db)
            .await
            .expect("cleanup");
    }
}
