use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use crate::clearable;

/// Retail price of a livestock product observed at a market on a date
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct LivestockRetailPrice {
    pub id: Uuid,
    pub livestock: String,
    pub unit: String,
    pub price: f64,
    pub market: Option<String>,
    pub district: String,
    pub price_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct LivestockRetailPriceFilter {
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub livestock: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub district: Option<String>,
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<String>")]
    pub market: Option<String>,
    /// Inclusive
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<NaiveDate>")]
    pub from_date: Option<NaiveDate>,
    /// Inclusive
    #[serde_as(as = "PickFirst<(NoneAsEmptyString, _)>")]
    #[ts(as = "Option<NaiveDate>")]
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateLivestockRetailPrice {
    pub livestock: String,
    pub unit: String,
    pub price: f64,
    pub market: Option<String>,
    pub district: String,
    pub price_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateLivestockRetailPrice {
    pub livestock: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(as = "Option<Option<String>>")]
    #[ts(optional)]
    pub market: Option<Option<String>>,
    pub district: Option<String>,
    pub price_date: Option<NaiveDate>,
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1 IS NULL OR livestock LIKE '%' || $1 || '%')
      AND ($2 IS NULL OR district = $2)
      AND ($3 IS NULL OR market = $3)
      AND ($4 IS NULL OR price_date >= $4)
      AND ($5 IS NULL OR price_date <= $5)"#;

impl LivestockRetailPrice {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LivestockRetailPrice>(
            "SELECT * FROM livestock_retail_prices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &LivestockRetailPriceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"SELECT * FROM livestock_retail_prices
               {FILTER_CLAUSE}
               ORDER BY price_date DESC, created_at DESC, rowid DESC
               LIMIT $6 OFFSET $7"#
        );
        sqlx::query_as::<_, LivestockRetailPrice>(&sql)
            .bind(filter.livestock.as_deref())
            .bind(filter.district.as_deref())
            .bind(filter.market.as_deref())
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_filtered(
        pool: &SqlitePool,
        filter: &LivestockRetailPriceFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM livestock_retail_prices {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.livestock.as_deref())
            .bind(filter.district.as_deref())
            .bind(filter.market.as_deref())
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_one(pool)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        data: &CreateLivestockRetailPrice,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LivestockRetailPrice>(
            r#"INSERT INTO livestock_retail_prices (id, livestock, unit, price, market, district, price_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.livestock)
        .bind(&data.unit)
        .bind(data.price)
        .bind(&data.market)
        .bind(&data.district)
        .bind(data.price_date)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateLivestockRetailPrice,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LivestockRetailPrice>(
            r#"UPDATE livestock_retail_prices
               SET livestock = COALESCE($2, livestock),
                   unit = COALESCE($3, unit),
                   price = COALESCE($4, price),
                   market = CASE WHEN $5 IS NULL THEN market ELSE NULLIF($5, '') END,
                   district = COALESCE($6, district),
                   price_date = COALESCE($7, price_date),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.livestock)
        .bind(&data.unit)
        .bind(data.price)
        .bind(clearable(&data.market))
        .bind(&data.district)
        .bind(data.price_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM livestock_retail_prices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
