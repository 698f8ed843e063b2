use db::{
    is_unique_violation,
    models::{
        company_profile::{
            CompanyProfile, CompanyProfileFilter, CreateCompanyProfile, UpdateCompanyProfile,
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
pub enum CompanyProfileError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Company with registration number {0} already exists")]
    Duplicate(String),
    #[error("Company profile not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

impl From<String> for CompanyProfileError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}

const EXPORT_HEADERS: &[&str] = &[
    "Registration Number",
    "Company Name",
    "Address",
    "District",
    "Contact Person",
    "Phone",
];

fn normalize_create(data: &CreateCompanyProfile) -> Result<CreateCompanyProfile, String> {
    Ok(CreateCompanyProfile {
        registration_number: required_text("Registration number", &data.registration_number)?,
        company_name: required_text("Company name", &data.company_name)?,
        address: optional_text(data.address.clone()),
        district: required_text("District", &data.district)?,
        contact_person: optional_text(data.contact_person.clone()),
        phone: optional_text(data.phone.clone()),
    })
}

fn normalize_update(changes: &UpdateCompanyProfile) -> Result<UpdateCompanyProfile, String> {
    let required = |label: &str, value: &Option<String>| {
        value.as_deref().map(|v| required_text(label, v)).transpose()
    };
    Ok(UpdateCompanyProfile {
        registration_number: required("Registration number", &changes.registration_number)?,
        company_name: required("Company name", &changes.company_name)?,
        address: clearable_text(&changes.address),
        district: required("District", &changes.district)?,
        contact_person: clearable_text(&changes.contact_person),
        phone: clearable_text(&changes.phone),
    })
}

fn map_unique(err: sqlx::Error, registration_number: &str) -> CompanyProfileError {
    if is_unique_violation(&err) {
        CompanyProfileError::Duplicate(registration_number.to_string())
    } else {
        CompanyProfileError::Database(err)
    }
}

pub struct CompanyProfileService;

impl CompanyProfileService {
    pub async fn list(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ListRequest<CompanyProfileFilter>,
    ) -> Result<Vec<CompanyProfile>, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Read).await?;
        Ok(CompanyProfile::find_filtered(
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
        filter: &CompanyProfileFilter,
    ) -> Result<i64, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Read).await?;
        Ok(CompanyProfile::count_filtered(pool, filter).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        user: &SessionUser,
        data: &CreateCompanyProfile,
    ) -> Result<CompanyProfile, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Write).await?;
        let data = normalize_create(data)?;

        if CompanyProfile::find_by_registration_number(pool, &data.registration_number)
            .await?
            .is_some()
        {
            return Err(CompanyProfileError::Duplicate(data.registration_number));
        }

        let profile = CompanyProfile::create(pool, &data, Uuid::new_v4())
            .await
            .map_err(|e| map_unique(e, &data.registration_number))?;

        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Created company profile {}", profile.registration_number),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %profile.id, "Company profile created");
        Ok(profile)
    }

    pub async fn update(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &UpdateRequest<UpdateCompanyProfile>,
    ) -> Result<CompanyProfile, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Write).await?;
        let changes = normalize_update(&request.changes)?;

        let existing = CompanyProfile::find_by_id(pool, request.id)
            .await?
            .ok_or(CompanyProfileError::NotFound)?;

        let new_number = changes
            .registration_number
            .as_deref()
            .filter(|number| *number != existing.registration_number);
        if let Some(number) = new_number {
            if CompanyProfile::find_by_registration_number(pool, number)
                .await?
                .is_some()
            {
                return Err(CompanyProfileError::Duplicate(number.to_string()));
            }
        }

        let profile = CompanyProfile::update(pool, request.id, &changes)
            .await
            .map_err(|e| map_unique(e, new_number.unwrap_or_default()))?
            .ok_or(CompanyProfileError::NotFound)?;

        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Updated company profile {}", profile.registration_number),
        )
        .await?;
        info!(user_uuid = %user.uuid, id = %profile.id, "Company profile updated");
        Ok(profile)
    }

    /// Deletes one id at a time; rows removed before a failure stay removed.
    pub async fn delete(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &DeleteRequest,
    ) -> Result<DeleteResult, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Write).await?;
        if request.ids.is_empty() {
            return Err(CompanyProfileError::Validation(
                "ids cannot be empty".to_string(),
            ));
        }

        let mut deleted = 0;
        for id in &request.ids {
            if CompanyProfile::delete(pool, *id).await? > 0 {
                deleted += 1;
                ActivityLogService::record(
                    pool,
                    Some(user.uuid),
                    format!("Deleted company profile {id}"),
                )
                .await?;
            }
        }

        info!(user_uuid = %user.uuid, deleted, "Company profiles deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn export(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &CompanyProfileFilter,
    ) -> Result<ExportFile, CompanyProfileError> {
        PrivilegeService::require(pool, user, Resource::CompanyProfile, Access::Export).await?;
        let rows: Vec<Vec<Cell>> = CompanyProfile::find_filtered(pool, filter, NO_LIMIT, 0)
            .await?
            .into_iter()
            .map(|c| {
                vec![
                    c.registration_number.into(),
                    c.company_name.into(),
                    c.address.into(),
                    c.district.into(),
                    c.contact_person.into(),
                    c.phone.into(),
                ]
            })
            .collect();
        let row_count = rows.len();

        let file = export_sheet(
            "company_profiles",
            &Sheet {
                name: "Company Profiles",
                headers: EXPORT_HEADERS,
                rows,
            },
        )?;
        ActivityLogService::record(
            pool,
            Some(user.uuid),
            format!("Exported {row_count} company profiles"),
        )
        .await?;
        Ok(file)
    }
}
