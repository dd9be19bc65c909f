use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::identity::repo_types::{Avatar, Role, User, UserSummary};

const USER_COLUMNS: &str = "id, provider_id, username, email, name, lastname, fullname, country, \
                            birthdate, skills, role_id, avatar_id, verified, completed, \
                            created_at, updated_at";

impl User {
    pub async fn create(
        db: &PgPool,
        provider_id: &str,
        email: &str,
        username: &str,
        role_id: Uuid,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (provider_id, email, username, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(provider_id)
        .bind(email)
        .bind(username)
        .bind(role_id)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Resolves a provider subject to the directory id plus role name.
    /// One round trip per authenticated request.
    pub async fn auth_lookup(db: &PgPool, provider_id: &str) -> sqlx::Result<Option<(Uuid, String)>> {
        sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT u.id, r.name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.provider_id = $1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(db)
        .await
    }

    pub async fn exists(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
    }

    pub async fn identifiers_taken(
        db: &PgPool,
        email: &str,
        username: &str,
    ) -> sqlx::Result<(bool, bool)> {
        sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1),
                   EXISTS(SELECT 1 FROM users WHERE username = $2)
            "#,
        )
        .bind(email)
        .bind(username)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        lastname: Option<&str>,
        fullname: Option<&str>,
        country: Option<&str>,
        birthdate: Option<Date>,
        skills: Option<&[String]>,
        completed: Option<bool>,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                lastname = COALESCE($3, lastname),
                fullname = COALESCE($4, fullname),
                country = COALESCE($5, country),
                birthdate = COALESCE($6, birthdate),
                skills = COALESCE($7, skills),
                completed = COALESCE($8, completed),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(lastname)
        .bind(fullname)
        .bind(country)
        .bind(birthdate)
        .bind(skills)
        .bind(completed)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn activate_by_email(db: &PgPool, email: &str) -> sqlx::Result<bool> {
        let res = sqlx::query(
            r#"UPDATE users SET verified = true, updated_at = now() WHERE email = $1"#,
        )
        .bind(email)
        .execute(db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, avatar_id: Uuid) -> sqlx::Result<()> {
        sqlx::query(r#"UPDATE users SET avatar_id = $2, updated_at = now() WHERE id = $1"#)
            .bind(id)
            .bind(avatar_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn find_summary(db: &PgPool, id: Uuid) -> sqlx::Result<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            r#"SELECT id, username, fullname, avatar_id FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Batch profile join for lists keyed by counterpart id. Ids with no
    /// surviving user row simply produce no entry.
    pub async fn find_summaries(db: &PgPool, ids: &[Uuid]) -> sqlx::Result<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            r#"SELECT id, username, fullname, avatar_id FROM users WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(db)
        .await
    }
}

impl Role {
    /// Roles a caller may pick on signup. ADMIN is assigned out of band.
    pub async fn find_public_by_name(db: &PgPool, name: &str) -> sqlx::Result<Option<Role>> {
        sqlx::query_as::<_, Role>(
            r#"SELECT id, name FROM roles WHERE name = $1 AND name <> 'ADMIN'"#,
        )
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn list_public(db: &PgPool) -> sqlx::Result<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            r#"SELECT id, name FROM roles WHERE name <> 'ADMIN' ORDER BY name"#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<Role>> {
        sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles"#)
            .fetch_all(db)
            .await
    }

    pub async fn name_of(db: &PgPool, id: Uuid) -> sqlx::Result<Option<String>> {
        sqlx::query_scalar::<_, String>(r#"SELECT name FROM roles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

impl Avatar {
    pub async fn create(db: &PgPool, title: &str, object_key: &str) -> sqlx::Result<Avatar> {
        sqlx::query_as::<_, Avatar>(
            r#"
            INSERT INTO avatars (title, object_key)
            VALUES ($1, $2)
            RETURNING id, title, object_key
            "#,
        )
        .bind(title)
        .bind(object_key)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Avatar>> {
        sqlx::query_as::<_, Avatar>(r#"SELECT id, title, object_key FROM avatars WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(r#"DELETE FROM avatars WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
