use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use crate::clearable;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FarmerProfile {
    pub id: Uuid,
    pub registration_number: String,
    pub name: String,
    pub identity_number: Option<String>,
    pub address: Option<String>,
    pub district: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter shared by list, count and export. Blank values mean "any".
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct FarmerProfileFilter {
    /// Matches name or registration number
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub search: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub district: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFarmerProfile {
    pub registration_number: String,
    pub name: String,
    pub identity_number: Option<String>,
    pub address: Option<String>,
    pub district: String,
    pub phone: Option<String>,
}

/// Absent fields are left alone; `null` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateFarmerProfile {
    pub registration_number: Option<String>,
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub identity_number: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub address: Option<Option<String>>,
    pub district: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub phone: Option<Option<String>>,
}

impl FarmerProfile {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FarmerProfile>("SELECT * FROM farmer_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_registration_number(
        pool: &SqlitePool,
        registration_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FarmerProfile>(
            "SELECT * FROM farmer_profiles WHERE registration_number = $1",
        )
        .bind(registration_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &FarmerProfileFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FarmerProfile>(
            r#"SELECT * FROM farmer_profiles
               WHERE ($1 IS NULL OR name LIKE '%' || $1 || '%' OR registration_number LIKE '%' || $1 || '%')
                 AND ($2 IS NULL OR district = $2)
               ORDER BY created_at DESC, rowid DESC
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.district.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_filtered(
        pool: &SqlitePool,
        filter: &FarmerProfileFilter,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM farmer_profiles
               WHERE ($1 IS NULL OR name LIKE '%' || $1 || '%' OR registration_number LIKE '%' || $1 || '%')
                 AND ($2 IS NULL OR district = $2)"#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.district.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateFarmerProfile,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FarmerProfile>(
            r#"INSERT INTO farmer_profiles (id, registration_number, name, identity_number, address, district, phone)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.registration_number)
        .bind(&data.name)
        .bind(&data.identity_number)
        .bind(&data.address)
        .bind(&data.district)
        .bind(&data.phone)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateFarmerProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FarmerProfile>(
            r#"UPDATE farmer_profiles
               SET registration_number = COALESCE($2, registration_number),
                   name = COALESCE($3, name),
                   identity_number = CASE WHEN $4 IS NULL THEN identity_number ELSE NULLIF($4, '') END,
                   address = CASE WHEN $5 IS NULL THEN address ELSE NULLIF($5, '') END,
                   district = COALESCE($6, district),
                   phone = CASE WHEN $7 IS NULL THEN phone ELSE NULLIF($7, '') END,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.registration_number)
        .bind(&data.name)
        .bind(clearable(&data.identity_number))
        .bind(clearable(&data.address))
        .bind(&data.district)
        .bind(clearable(&data.phone))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM farmer_profiles WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let changes: UpdateFarmerProfile =
            serde_json::from_value(json!({ "phone": null, "address": "Rua 5" })).unwrap();
        assert_eq!(changes.phone, Some(None));
        assert_eq!(changes.address, Some(Some("Rua 5".to_string())));
        assert_eq!(changes.identity_number, None);
    }
}
