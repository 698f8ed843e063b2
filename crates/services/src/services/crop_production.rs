use chrono::{Datelike, Utc};
use db::models::{
    crop_production::{
        CreateCropProduction, CropProduction, CropProductionFilter, CropProductionWithFarmer,
        UpdateCropProduction,
    },
    farmer_profile::FarmerProfile,
    pagination::NO_LIMIT,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::{
    activity_log::ActivityLogService,
    export::{Cell, ExportError, ExportFile, Sheet, export_sheet},
    privilege::{Access, PrivilegeError, PrivilegeService, Resource},
    request::{DeleteRequest, DeleteResult, ListRequest, UpdateRequest, required_text},
    session::SessionUser,
};

const MIN_YEAR: i32 = 1900;

#[derive(Debug, Error)]
pub enum CropProductionError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Farmer profile {0} does not exist")]
    InvalidReference(Uuid),
    #[error("Crop production not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

impl From<String> for CropProductionError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}

const EXPORT_HEADERS: &[&str] = &[
    "Farmer Registration Number",
    "Farmer Name",
    "Crop",
    "Year",
    "Month",
    "Planted Area (ha)",
    "Production (t)",
    "District",
];

fn check_period(year: Option<i32>, month: Option<i32>) -> Result<(), String> {
    let max_year = Utc::now().year() + 1;
    if let Some(year) = year {
        if !(MIN_YEAR..=max_year).contains(&year) {
            return Err(format!("Year must be between {MIN_YEAR} and {max_year}"));
        }
    }
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            return Err("Month must be between 1 and 12".to_string());
        }
    }
    Ok(())
}

fn check_amount(label: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(format!("{label} cannot be negative")),
        _ => Ok(()),
    }
}

fn normalize_create(data: &CreateCropProduction) -> Result<CreateCropProduction, String> {
    check_period(Some(data.year), Some(data.month))?;
    check_amount("Planted area", Some(data.planted_area))?;
    check_amount("Production", Some(data.production))?;
    Ok(CreateCropProduction {
        crop_name: required_text("Crop name", &data.crop_name)?,
        district: required_text("District", &data.district)?,
        ..data.clone()
    })
}

fn normalize_update(changes: &UpdateCropProduction) -> Result<UpdateCropProduction, String> {
    check_period(changes.year, changes.month)?;
    check_amount("Planted area", changes.planted_area)?;
    check_amount("Production", changes.production)?;
    Ok(UpdateCropProduction {
        crop_name: changes
            .crop_name
            .as_deref()
            .map(|v| required_text("Crop name", v))
            .transpose()?,
        district: changes
            .district
            .as_deref()
            .map(|v| required_text("District", v))
            .transpose()?,
        ..changes.clone()
    })
}

async fn ensure_farmer_exists(
    pool: &SqlitePool,
    farmer_profile_id: Uuid,
) -> Result<(), CropProductionError> {
    match FarmerProfile::find_by_id(pool, farmer_profile_id).await? {
        Some(_) => Ok(()),
        None => Err(CropProductionError::InvalidReference(farmer_profile_id)),
    }
}

pub struct CropProductionService;

impl CropProductionService {
    pub async fn list(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ListRequest<CropProductionFilter>,
    ) -> Result<Vec<CropProductionWithFarmer>, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Read).await?;
        Ok(CropProduction::find_filtered(
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
        filter: &CropProductionFilter,
    ) -> Result<i64, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Read).await?;
        Ok(CropProduction::count_filtered(pool, filter).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        user: &SessionUser,
        data: &CreateCropProduction,
    ) -> Result<CropProduction, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Write).await?;
        let data = normalize_create(data)?;
        ensure_farmer_exists(pool, data.farmer_profile_id).await?;

        let record = CropProduction::create(pool, &data, Uuid::new_v4()).await?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!(
                "Created crop production {} {}/{}",
                record.crop_name, record.month, record.year
            ),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %record.id, "Crop production created");
        Ok(record)
    }

    pub async fn update(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &UpdateRequest<UpdateCropProduction>,
    ) -> Result<CropProduction, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Write).await?;
        let changes = normalize_update(&request.changes)?;
        if let Some(farmer_profile_id) = changes.farmer_profile_id {
            ensure_farmer_exists(pool, farmer_profile_id).await?;
        }

        let record = CropProduction::update(pool, request.id, &changes)
            .await?
            .ok_or(CropProductionError::NotFound)?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Updated crop production {}", record.id),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %record.id, "Crop production updated");
        Ok(record)
    }

    /// Deletes one id at a time; rows removed before a failure stay removed.
    pub async fn delete(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &DeleteRequest,
    ) -> Result<DeleteResult, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Write).await?;
        if request.ids.is_empty() {
            return Err(CropProductionError::Validation(
                "ids cannot be empty".to_string(),
            ));
        }

        let mut deleted = 0;
        for id in &request.ids {
            if CropProduction::delete(pool, *id).await? > 0 {
                deleted += 1;
                ActivityLogService::record(
                    pool,
                    Some(user.uuid),
                    format!("Deleted crop production {id}"),
                )
                .await?;
            }
        }

        info!(user_uuid = %user.uuid, deleted, "Crop productions deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn export(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &CropProductionFilter,
    ) -> Result<ExportFile, CropProductionError> {
        PrivilegeService::require(pool, user, Resource::CropProduction, Access::Export).await?;
        let rows: Vec<Vec<Cell>> = CropProduction::find_filtered(pool, filter, NO_LIMIT, 0)
            .await?
            .into_iter()
            .map(|row| {
                vec![
                    row.farmer_registration_number.into(),
                    row.farmer_name.into(),
                    row.record.crop_name.into(),
                    row.record.year.into(),
                    row.record.month.into(),
                    row.record.planted_area.into(),
                    row.record.production.into(),
                    row.record.district.into(),
                ]
            })
            .collect();
        let row_count = rows.len();

        let file = export_sheet(
            "crop_productions",
            &Sheet {
                name: "Crop Productions",
                headers: EXPORT_HEADERS,
                rows,
            },
        )?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Exported {row_count} crop productions"),
        )
        .await?;
        Ok(file)
    }
}
