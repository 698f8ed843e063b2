use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Audit entry written after every mutating operation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_uuid: Option<Uuid>,
    pub activity: String,
    pub created_at: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct ActivityLogFilter {
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<Uuid>")]
    pub user_uuid: Option<Uuid>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub search: Option<String>,
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1 IS NULL OR user_uuid = $1)
      AND ($2 IS NULL OR activity LIKE '%' || $2 || '%')"#;

impl ActivityLog {
    pub async fn create(
        pool: &SqlitePool,
        user_uuid: Option<Uuid>,
        activity: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            "INSERT INTO activity_logs (id, user_uuid, activity) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_uuid)
        .bind(activity)
        .fetch_one(pool)
        .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &ActivityLogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM activity_logs {FILTER_CLAUSE} ORDER BY created_at DESC, rowid DESC LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, ActivityLog>(&sql)
            .bind(filter.user_uuid)
            .bind(filter.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_filtered(
        pool: &SqlitePool,
        filter: &ActivityLogFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM activity_logs {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.user_uuid)
            .bind(filter.search.as_deref())
            .fetch_one(pool)
            .await
    }
}
