use db::{
    is_unique_violation,
    models::{
        farmer_profile::{
            CreateFarmerProfile, FarmerProfile, FarmerProfileFilter, UpdateFarmerProfile,
        },
        pagination::NO_LIMIT,
    },
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
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
pub enum FarmerProfileError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Farmer with registration number {0} already exists")]
    Duplicate(String),
    #[error("Farmer profile not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

impl From<String> for FarmerProfileError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}

const EXPORT_HEADERS: &[&str] = &[
    "Registration Number",
    "Name",
    "Identity Number",
    "Address",
    "District",
    "Phone",
];

fn normalize_create(data: &CreateFarmerProfile) -> Result<CreateFarmerProfile, String> {
    Ok(CreateFarmerProfile {
        registration_number: required_text("Registration number", &data.registration_number)?,
        name: required_text("Name", &data.name)?,
        identity_number: optional_text(data.identity_number.clone()),
        address: optional_text(data.address.clone()),
        district: required_text("District", &data.district)?,
        phone: optional_text(data.phone.clone()),
    })
}

fn normalize_update(changes: &UpdateFarmerProfile) -> Result<UpdateFarmerProfile, String> {
    let required = |label: &str, value: &Option<String>| {
        value.as_deref().map(|v| required_text(label, v)).transpose()
    };
    Ok(UpdateFarmerProfile {
        registration_number: required("Registration number", &changes.registration_number)?,
        name: required("Name", &changes.name)?,
        identity_number: clearable_text(&changes.identity_number),
        address: clearable_text(&changes.address),
        district: required("District", &changes.district)?,
        phone: clearable_text(&changes.phone),
    })
}

pub struct FarmerProfileService;

impl FarmerProfileService {
    pub async fn list(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ListRequest<FarmerProfileFilter>,
    ) -> Result<Vec<FarmerProfile>, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Read).await?;
        Ok(FarmerProfile::find_filtered(
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
        filter: &FarmerProfileFilter,
    ) -> Result<i64, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Read).await?;
        Ok(FarmerProfile::count_filtered(pool, filter).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        user: &SessionUser,
        data: &CreateFarmerProfile,
    ) -> Result<FarmerProfile, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Write).await?;
        let data = normalize_create(data)?;

        if FarmerProfile::find_by_registration_number(pool, &data.registration_number)
            .await?
            .is_some()
        {
            return Err(FarmerProfileError::Duplicate(data.registration_number));
        }

        let profile = FarmerProfile::create(pool, &data, Uuid::new_v4())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FarmerProfileError::Duplicate(data.registration_number.clone())
                } else {
                    FarmerProfileError::Database(e)
                }
            })?;

        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Created farmer profile {}", profile.registration_number),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %profile.id, "Farmer profile created");
        Ok(profile)
    }

    pub async fn update(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &UpdateRequest<UpdateFarmerProfile>,
    ) -> Result<FarmerProfile, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Write).await?;
        let changes = normalize_update(&request.changes)?;

        let existing = FarmerProfile::find_by_id(pool, request.id)
            .await?
            .ok_or(FarmerProfileError::NotFound)?;

        if let Some(number) = changes.registration_number.as_deref() {
            if number != existing.registration_number
                && FarmerProfile::find_by_registration_number(pool, number)
                    .await?
                    .is_some()
            {
                return Err(FarmerProfileError::Duplicate(number.to_string()));
            }
        }

        let profile = FarmerProfile::update(pool, request.id, &changes)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FarmerProfileError::Duplicate(
                        changes.registration_number.clone().unwrap_or_default(),
                    )
                } else {
                    FarmerProfileError::Database(e)
                }
            })?
            .ok_or(FarmerProfileError::NotFound)?;

        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Updated farmer profile {}", profile.registration_number),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %profile.id, "Farmer profile updated");
        Ok(profile)
    }

    /// Deletes one id at a time; rows removed before a failure stay removed.
    pub async fn delete(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &DeleteRequest,
    ) -> Result<DeleteResult, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Write).await?;
        if request.ids.is_empty() {
            return Err(FarmerProfileError::Validation("ids cannot be empty".to_string()));
        }

        let mut deleted = 0;
        for id in &request.ids {
            if FarmerProfile::delete(pool, *id).await? > 0 {
                deleted += 1;
                ActivityLogService::record(
                    pool,
                    Some(user.uuid),
                    format!("Deleted farmer profile {id}"),
                )
                .await?;
            }
        }

        info!(user_uuid = %user.uuid, deleted, "Farmer profiles deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn export(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &FarmerProfileFilter,
    ) -> Result<ExportFile, FarmerProfileError> {
        PrivilegeService::require(pool, user, Resource::FarmerProfile, Access::Export).await?;
        let profiles = FarmerProfile::find_filtered(pool, filter, NO_LIMIT, 0).await?;

        let rows = profiles
            .into_iter()
            .map(|p| {
                vec![
                    Cell::from(p.registration_number),
                    Cell::from(p.name),
                    Cell::from(p.identity_number),
                    Cell::from(p.address),
                    Cell::from(p.district),
                    Cell::from(p.phone),
                ]
            })
            .collect::<Vec<_>>();
        let row_count = rows.len();

        let file = export_sheet(
            "farmer_profiles",
            &Sheet {
                name: "Farmer Profiles",
                headers: EXPORT_HEADERS,
                rows,
            },
        )?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Exported {row_count} farmer profiles"),
        )
        .await?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_create_trims_and_blanks() {
        let data = CreateFarmerProfile {
            registration_number: " F-001 ".to_string(),
            name: "Maria".to_string(),
            identity_number: Some("   ".to_string()),
            address: None,
            district: "Baucau".to_string(),
            phone: Some(" 7700 ".to_string()),
        };
        let normalized = normalize_create(&data).unwrap();
        assert_eq!(normalized.registration_number, "F-001");
        assert_eq!(normalized.identity_number, None);
        assert_eq!(normalized.phone.as_deref(), Some("7700"));
    }

    #[test]
    fn test_normalize_update_rejects_blank_required_fields() {
        let changes = UpdateFarmerProfile {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize_update(&changes).unwrap_err(), "Name is required");
    }
}
