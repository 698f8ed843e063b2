use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Production of one crop by one farmer for a month
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CropProduction {
    pub id: Uuid,
    pub farmer_profile_id: Uuid, // Foreign key to FarmerProfile
    pub crop_name: String,
    pub year: i32,
    pub month: i32,
    pub planted_area: f64, // hectares
    pub production: f64,   // tonnes
    pub district: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CropProductionWithFarmer {
    #[serde(flatten)]
    #[ts(flatten)]
    #[sqlx(flatten)]
    pub record: CropProduction,
    pub farmer_name: String,
    pub farmer_registration_number: String,
}

impl std::ops::Deref for CropProductionWithFarmer {
    type Target = CropProduction;
    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct CropProductionFilter {
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<Uuid>")]
    pub farmer_profile_id: Option<Uuid>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub crop_name: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub district: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<i32>")]
    pub year: Option<i32>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<i32>")]
    pub month: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCropProduction {
    pub farmer_profile_id: Uuid,
    pub crop_name: String,
    pub year: i32,
    pub month: i32,
    pub planted_area: f64,
    pub production: f64,
    pub district: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCropProduction {
    pub farmer_profile_id: Option<Uuid>,
    pub crop_name: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub planted_area: Option<f64>,
    pub production: Option<f64>,
    pub district: Option<String>,
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1 IS NULL OR cp.farmer_profile_id = $1)
      AND ($2 IS NULL OR cp.crop_name LIKE '%' || $2 || '%')
      AND ($3 IS NULL OR cp.district = $3)
      AND ($4 IS NULL OR cp.year = $4)
      AND ($5 IS NULL OR cp.month = $5)"#;

impl CropProduction {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropProduction>("SELECT * FROM crop_productions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &CropProductionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CropProductionWithFarmer>, sqlx::Error> {
        let sql = format!(
            r#"SELECT cp.*,
                      f.name AS farmer_name,
                      f.registration_number AS farmer_registration_number
               FROM crop_productions cp
               JOIN farmer_profiles f ON f.id = cp.farmer_profile_id
               {FILTER_CLAUSE}
               ORDER BY cp.year DESC, cp.month DESC, cp.created_at DESC, cp.rowid DESC
               LIMIT $6 OFFSET $7"#
        );
        sqlx::query_as::<_, CropProductionWithFarmer>(&sql)
            .bind(filter.farmer_profile_id)
            .bind(filter.crop_name.as_deref())
            .bind(filter.district.as_deref())
            .bind(filter.year)
            .bind(filter.month)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_filtered(
        pool: &SqlitePool,
        filter: &CropProductionFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM crop_productions cp {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.farmer_profile_id)
            .bind(filter.crop_name.as_deref())
            .bind(filter.district.as_deref())
            .bind(filter.year)
            .bind(filter.month)
            .fetch_one(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateCropProduction,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CropProduction>(
            r#"INSERT INTO crop_productions (id, farmer_profile_id, crop_name, year, month, planted_area, production, district)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(id)
        .bind(data.farmer_profile_id)
        .bind(&data.crop_name)
        .bind(data.year)
        .bind(data.month)
        .bind(data.planted_area)
        .bind(data.production)
        .bind(&data.district)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCropProduction,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropProduction>(
            r#"UPDATE crop_productions
               SET farmer_profile_id = COALESCE($2, farmer_profile_id),
                   crop_name = COALESCE($3, crop_name),
                   year = COALESCE($4, year),
                   month = COALESCE($5, month),
                   planted_area = COALESCE($6, planted_area),
                   production = COALESCE($7, production),
                   district = COALESCE($8, district),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(data.farmer_profile_id)
        .bind(&data.crop_name)
        .bind(data.year)
        .bind(data.month)
        .bind(data.planted_area)
        .bind(data.production)
        .bind(&data.district)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM crop_productions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
