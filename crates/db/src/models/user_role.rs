use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Named set of privilege strings assigned to users
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserRole {
    pub id: Uuid,
    pub name: String,
    pub privileges: String, // JSON-serialized Vec<String>
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRole {
    /// Parse the privileges JSON; a corrupt value grants nothing
    pub fn privilege_list(&self) -> Vec<String> {
        serde_json::from_str(&self.privileges).unwrap_or_default()
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privilege_list().iter().any(|p| p == privilege)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserRoleView {
    pub id: Uuid,
    pub name: String,
    pub privileges: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRole> for UserRoleView {
    fn from(role: UserRole) -> Self {
        Self {
            privileges: role.privilege_list(),
            id: role.id,
            name: role.name,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUserRole {
    pub name: String,
    pub privileges: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUserRole {
    pub name: Option<String>,
    pub privileges: Option<Vec<String>>,
}

fn encode_privileges(privileges: &[String]) -> Result<String, sqlx::Error> {
    serde_json::to_string(privileges).map_err(|e| sqlx::Error::Protocol(e.to_string()))
}

impl UserRole {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateUserRole,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let privileges = encode_privileges(&data.privileges)?;
        sqlx::query_as::<_, UserRole>(
            "INSERT INTO user_roles (id, name, privileges) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(id)
        .bind(&data.name)
        .bind(privileges)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateUserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let privileges = data
            .privileges
            .as_deref()
            .map(encode_privileges)
            .transpose()?;
        sqlx::query_as::<_, UserRole>(
            r#"UPDATE user_roles
               SET name = COALESCE($2, name),
                   privileges = COALESCE($3, privileges),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(privileges)
        .fetch_optional(pool)
        .await
    }
}
