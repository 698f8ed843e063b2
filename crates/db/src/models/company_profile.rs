use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use crate::clearable;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub registration_number: String,
    pub company_name: String,
    pub address: Option<String>,
    pub district: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct CompanyProfileFilter {
    /// Matches company name or registration number
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub search: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub district: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCompanyProfile {
    pub registration_number: String,
    pub company_name: String,
    pub address: Option<String>,
    pub district: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCompanyProfile {
    pub registration_number: Option<String>,
    pub company_name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub address: Option<Option<String>>,
    pub district: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub contact_person: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub phone: Option<Option<String>>,
}

impl CompanyProfile {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>("SELECT * FROM company_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_registration_number(
        pool: &SqlitePool,
        registration_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE registration_number = $1",
        )
        .bind(registration_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &CompanyProfileFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(
            r#"SELECT * FROM company_profiles
               WHERE ($1 IS NULL OR company_name LIKE '%' || $1 || '%' OR registration_number LIKE '%' || $1 || '%')
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
        filter: &CompanyProfileFilter,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM company_profiles
               WHERE ($1 IS NULL OR company_name LIKE '%' || $1 || '%' OR registration_number LIKE '%' || $1 || '%')
                 AND ($2 IS NULL OR district = $2)"#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.district.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateCompanyProfile,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(
            r#"INSERT INTO company_profiles (id, registration_number, company_name, address, district, contact_person, phone)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.registration_number)
        .bind(&data.company_name)
        .bind(&data.address)
        .bind(&data.district)
        .bind(&data.contact_person)
        .bind(&data.phone)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCompanyProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(
            r#"UPDATE company_profiles
               SET registration_number = COALESCE($2, registration_number),
                   company_name = COALESCE($3, company_name),
                   address = CASE WHEN $4 IS NULL THEN address ELSE NULLIF($4, '') END,
                   district = COALESCE($5, district),
                   contact_person = CASE WHEN $6 IS NULL THEN contact_person ELSE NULLIF($6, '') END,
                   phone = CASE WHEN $7 IS NULL THEN phone ELSE NULLIF($7, '') END,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.registration_number)
        .bind(&data.company_name)
        .bind(clearable(&data.address))
        .bind(&data.district)
        .bind(clearable(&data.contact_person))
        .bind(clearable(&data.phone))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM company_profiles WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
