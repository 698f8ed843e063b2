use db::models::{
    livestock_price::{
        CreateLivestockRetailPrice, LivestockRetailPrice, LivestockRetailPriceFilter,
        UpdateLivestockRetailPrice,
    },
    pagination::NO_LIMIT,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity_log::ActivityLogService,
    export::{Cell, ExportError, ExportFile, Sheet, export_sheet},
    privilege::{Access, PrivilegeError, PrivilegeService, Resource},
    request::{
        DeleteRequest, DeleteResult, ListRequest, UpdateRequest, clearable_text, optional_text,
        required_text,
    },
    session::SessionUser,
};

#[derive(Debug, Error)]
pub enum LivestockPriceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Livestock retail price not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

impl From<String> for LivestockPriceError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}

/// Rows parsed client-side from an uploaded spreadsheet
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ImportLivestockRetailPrices {
    pub details: Vec<CreateLivestockRetailPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ImportResult {
    pub imported: usize,
}

const EXPORT_HEADERS: &[&str] = &["Date", "Livestock", "Unit", "Price", "Market", "District"];

fn check_price(price: Option<f64>) -> Result<(), String> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err("Price cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn normalize_create(data: &CreateLivestockRetailPrice) -> Result<CreateLivestockRetailPrice, String> {
    check_price(Some(data.price))?;
    Ok(CreateLivestockRetailPrice {
        livestock: required_text("Livestock", &data.livestock)?,
        unit: required_text("Unit", &data.unit)?,
        price: data.price,
        market: optional_text(data.market.clone()),
        district: required_text("District", &data.district)?,
        price_date: data.price_date,
    })
}

fn normalize_update(
    changes: &UpdateLivestockRetailPrice,
) -> Result<UpdateLivestockRetailPrice, String> {
    check_price(changes.price)?;
    let required = |label: &str, value: &Option<String>| {
        value.as_deref().map(|v| required_text(label, v)).transpose()
    };
    Ok(UpdateLivestockRetailPrice {
        livestock: required("Livestock", &changes.livestock)?,
        unit: required("Unit", &changes.unit)?,
        price: changes.price,
        market: clearable_text(&changes.market),
        district: required("District", &changes.district)?,
        price_date: changes.price_date,
    })
}

pub struct LivestockPriceService;

impl LivestockPriceService {
    pub async fn list(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ListRequest<LivestockRetailPriceFilter>,
    ) -> Result<Vec<LivestockRetailPrice>, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Read).await?;
        Ok(LivestockRetailPrice::find_filtered(
            pool,
            &request.filter,
            request.page.limit(),
            request.page.offset(),
        )
        .await?)
    }

    pub async fn count(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &LivestockRetailPriceFilter,
    ) -> Result<i64, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Read).await?;
        Ok(LivestockRetailPrice::count_filtered(pool, filter).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        user: &SessionUser,
        data: &CreateLivestockRetailPrice,
    ) -> Result<LivestockRetailPrice, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Write)
            .await?;
        let data = normalize_create(data)?;

        let price = LivestockRetailPrice::create(pool, &data, Uuid::new_v4()).await?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!(
                "Created livestock retail price {} {}",
                price.livestock, price.price_date
            ),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %price.id, "Livestock retail price created");
        Ok(price)
    }

    /// Insert every row of `details`. All rows are validated before the
    /// first insert; inserts run one by one without a transaction.
    pub async fn import(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ImportLivestockRetailPrices,
    ) -> Result<ImportResult, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Write)
            .await?;
        if request.details.is_empty() {
            return Err(LivestockPriceError::Validation(
                "Import details cannot be empty".to_string(),
            ));
        }

        let rows = request
            .details
            .iter()
            .enumerate()
            .map(|(index, row)| {
                normalize_create(row).map_err(|message| format!("Row {}: {message}", index + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in &rows {
            LivestockRetailPrice::create(pool, row, Uuid::new_v4()).await?;
        }

        let imported = rows.len();
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Imported {imported} livestock retail prices"),
        )
        .await?;
        info!(user_uuid = %user.uuid, imported, "Livestock retail prices imported");
        Ok(ImportResult { imported })
    }

    pub async fn update(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &UpdateRequest<UpdateLivestockRetailPrice>,
    ) -> Result<LivestockRetailPrice, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Write)
            .await?;
        let changes = normalize_update(&request.changes)?;

        let price = LivestockRetailPrice::update(pool, request.id, &changes)
            .await?
            .ok_or(LivestockPriceError::NotFound)?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Updated livestock retail price {}", price.id),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %price.id, "Livestock retail price updated");
        Ok(price)
    }

    /// Deletes one id at a time; rows removed before a failure stay removed.
    pub async fn delete(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &DeleteRequest,
    ) -> Result<DeleteResult, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Write)
            .await?;
        if request.ids.is_empty() {
            return Err(LivestockPriceError::Validation(
                "ids cannot be empty".to_string(),
            ));
        }

        let mut deleted = 0;
        for id in &request.ids {
            if LivestockRetailPrice::delete(pool, *id).await? > 0 {
                deleted += 1;
                ActivityLogService::record(
                    pool,
                    Some(user.uuid),
                    format!("Deleted livestock retail price {id}"),
                )
                .await?;
            }
        }

        info!(user_uuid = %user.uuid, deleted, "Livestock retail prices deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn export(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &LivestockRetailPriceFilter,
    ) -> Result<ExportFile, LivestockPriceError> {
        PrivilegeService::require(pool, user, Resource::LivestockRetailPrice, Access::Export)
            .await?;
        let rows: Vec<Vec<Cell>> = LivestockRetailPrice::find_filtered(pool, filter, NO_LIMIT, 0)
            .await?
            .into_iter()
            .map(|p| {
                vec![
                    p.price_date.format("%Y-%m-%d").to_string().into(),
                    p.livestock.into(),
                    p.unit.into(),
                    p.price.into(),
                    p.market.into(),
                    p.district.into(),
                ]
            })
            .collect();
        let row_count = rows.len();

        let file = export_sheet(
            "livestock_retail_prices",
            &Sheet {
                name: "Livestock Retail Prices",
                headers: EXPORT_HEADERS,
                rows,
            },
        )?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Exported {row_count} livestock retail prices"),
        )
        .await?;
        Ok(file)
    }
}
