use sqlx::PgPool;
use uuid::Uuid;

use crate::reports::repo_types::{Report, ReportMessage};

const REPORT_COLUMNS: &str = "id, sender_id, receiver_id, issue, content, answered, created_at, updated_at";

impl Report {
    pub async fn create(
        db: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
        issue: &str,
        content: &str,
    ) -> sqlx::Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (sender_id, receiver_id, issue, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .bind(issue)
        .bind(content)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn exists(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM reports WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
    }

    /// Reports the user filed or is the subject of, newest first.
    pub async fn list_touching(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            SELECT {REPORT_COLUMNS} FROM reports
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        content: Option<&str>,
        answered: Option<bool>,
    ) -> sqlx::Result<Option<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports
            SET content = COALESCE($2, content),
                answered = COALESCE($3, answered),
                updated_at = now()
            WHERE id = $1
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content)
        .bind(answered)
        .fetch_optional(db)
        .await
    }

    pub async fn mark_answered(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports
            SET answered = true, updated_at = now()
            WHERE id = $1
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }
}

impl ReportMessage {
    pub async fn insert(
        db: &PgPool,
        report_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> sqlx::Result<ReportMessage> {
        sqlx::query_as::<_, ReportMessage>(
            r#"
            INSERT INTO report_messages (report_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, report_id, author_id, content, read, created_at
            "#,
        )
        .bind(report_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(db)
        .await
    }

    /// Thread under a report, oldest first.
    pub async fn list_for(db: &PgPool, report_id: Uuid) -> sqlx::Result<Vec<ReportMessage>> {
        sqlx::query_as::<_, ReportMessage>(
            r#"
            SELECT id, report_id, author_id, content, read, created_at
            FROM report_messages
            WHERE report_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(db)
        .await
    }
}
