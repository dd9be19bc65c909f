use sqlx::PgPool;
use uuid::Uuid;

use crate::messaging::repo_types::DirectMessage;

impl DirectMessage {
    pub async fn insert(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> sqlx::Result<DirectMessage> {
        sqlx::query_as::<_, DirectMessage>(
            r#"
            INSERT INTO direct_messages (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, receiver_id, content, read, created_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(db)
        .await
    }

    /// Bulk read-state transition: everything the counterpart sent to the
    /// reader that is still unread. Returns how many rows flipped.
    pub async fn mark_conversation_read(
        db: &PgPool,
        reader_id: Uuid,
        counterpart_id: Uuid,
    ) -> sqlx::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE direct_messages
            SET read = true
            WHERE receiver_id = $1 AND sender_id = $2 AND read = false
            "#,
        )
        .bind(reader_id)
        .bind(counterpart_id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    /// Full two-party history, oldest first.
    pub async fn conversation(
        db: &PgPool,
        a: Uuid,
        b: Uuid,
    ) -> sqlx::Result<Vec<DirectMessage>> {
        sqlx::query_as::<_, DirectMessage>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM direct_messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(db)
        .await
    }

    /// Every message the user sent or received, newest first. Input for the
    /// summary grouping pass.
    pub async fn all_touching(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<DirectMessage>> {
        sqlx::query_as::<_, DirectMessage>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM direct_messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}
