use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::clearable;

/// How the account was registered. Super admins bypass privilege checks.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "register_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegisterType {
    SuperAdmin,
    #[default]
    Officer,
    Viewer,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub user_id: String, // login name
    pub employee_id: Option<String>,
    pub register_type: RegisterType,
    pub role_id: Option<Uuid>,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct UserFilter {
    /// Matches login name or employee id
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub search: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<RegisterType>")]
    pub register_type: Option<RegisterType>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<UserStatus>")]
    pub status: Option<UserStatus>,
}

/// Insert payload; the password is already hashed by the caller
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub employee_id: Option<String>,
    pub register_type: RegisterType,
    pub role_id: Option<Uuid>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUser {
    /// `null` clears the employee id
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub employee_id: Option<Option<String>>,
    pub register_type: Option<RegisterType>,
    pub role_id: Option<Uuid>,
    pub status: Option<UserStatus>,
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1 IS NULL OR user_id LIKE '%' || $1 || '%' OR employee_id LIKE '%' || $1 || '%')
      AND ($2 IS NULL OR register_type = $2)
      AND ($3 IS NULL OR status = $3)"#;

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM users {FILTER_CLAUSE} ORDER BY created_at DESC, rowid DESC LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(filter.search.as_deref())
            .bind(filter.register_type)
            .bind(filter.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_filtered(pool: &SqlitePool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM users {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.search.as_deref())
            .bind(filter.register_type)
            .bind(filter.status)
            .fetch_one(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &NewUser, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, user_id, employee_id, register_type, role_id, password_hash)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.user_id)
        .bind(&data.employee_id)
        .bind(data.register_type)
        .bind(data.role_id)
        .bind(&data.password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET employee_id = CASE WHEN $2 IS NULL THEN employee_id ELSE NULLIF($2, '') END,
                   register_type = COALESCE($3, register_type),
                   role_id = COALESCE($4, role_id),
                   status = COALESCE($5, status),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(clearable(&data.employee_id))
        .bind(data.register_type)
        .bind(data.role_id)
        .bind(data.status)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_password_hash(
        pool: &SqlitePool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
