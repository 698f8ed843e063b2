use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// Login session identified by an opaque bearer token
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSession {
    pub id: Uuid,
    pub token: String,
    pub user_uuid: Uuid,
    pub logged_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    pub fn is_logged_out(&self) -> bool {
        self.logged_out_at.is_some()
    }

    pub async fn create(
        pool: &SqlitePool,
        user_uuid: Uuid,
        token: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserSession>(
            "INSERT INTO user_sessions (id, token, user_uuid) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(user_uuid)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_token(
        pool: &SqlitePool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSession>("SELECT * FROM user_sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_logged_out(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE user_sessions
               SET logged_out_at = datetime('now', 'subsec')
               WHERE id = $1 AND logged_out_at IS NULL"#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Log out every open session of a user, e.g. after a password reset
    pub async fn end_all_for_user(pool: &SqlitePool, user_uuid: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE user_sessions
               SET logged_out_at = datetime('now', 'subsec')
               WHERE user_uuid = $1 AND logged_out_at IS NULL"#,
        )
        .bind(user_uuid)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
