use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deployment::DeploymentError;
use services::services::{
    activity_log::ActivityLogError,
    company_profile::CompanyProfileError,
    crop_production::CropProductionError,
    export::ExportError,
    farmer_profile::FarmerProfileError,
    livestock_price::LivestockPriceError,
    password::PasswordError,
    privilege::PrivilegeError,
    session::SessionError,
    user_management::UserManagementError,
};
use thiserror::Error;
use tracing::error;
use utils::{response::ApiResponse, tokenize::TokenizeError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error(transparent)]
    QueryString(#[from] QueryRejection),
    #[error(transparent)]
    PathParams(#[from] PathRejection),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    FarmerProfile(#[from] FarmerProfileError),
    #[error(transparent)]
    CompanyProfile(#[from] CompanyProfileError),
    #[error(transparent)]
    CropProduction(#[from] CropProductionError),
    #[error(transparent)]
    LivestockPrice(#[from] LivestockPriceError),
    #[error(transparent)]
    UserManagement(#[from] UserManagementError),
    #[error(transparent)]
    ActivityLog(#[from] ActivityLogError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const INTERNAL: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

fn privilege_status(err: &PrivilegeError) -> StatusCode {
    match err {
        PrivilegeError::Forbidden(_) => StatusCode::FORBIDDEN,
        PrivilegeError::Database(_) => INTERNAL,
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::JsonBody(err) => err.status(),
            ApiError::QueryString(err) => err.status(),
            ApiError::PathParams(err) => err.status(),
            ApiError::Session(err) => match err {
                SessionError::Database(_) => INTERNAL,
                _ => StatusCode::UNAUTHORIZED,
            },
            ApiError::Privilege(err) => privilege_status(err),
            ApiError::Tokenize(_) => StatusCode::BAD_REQUEST,
            ApiError::FarmerProfile(err) => match err {
                FarmerProfileError::Privilege(e) => privilege_status(e),
                FarmerProfileError::Duplicate(_) => StatusCode::CONFLICT,
                FarmerProfileError::NotFound => StatusCode::NOT_FOUND,
                FarmerProfileError::Validation(_) => StatusCode::BAD_REQUEST,
                FarmerProfileError::Database(_) | FarmerProfileError::Export(_) => INTERNAL,
            },
            ApiError::CompanyProfile(err) => match err {
                CompanyProfileError::Privilege(e) => privilege_status(e),
                CompanyProfileError::Duplicate(_) => StatusCode::CONFLICT,
                CompanyProfileError::NotFound => StatusCode::NOT_FOUND,
                CompanyProfileError::Validation(_) => StatusCode::BAD_REQUEST,
                CompanyProfileError::Database(_) | CompanyProfileError::Export(_) => INTERNAL,
            },
            ApiError::CropProduction(err) => match err {
                CropProductionError::Privilege(e) => privilege_status(e),
                CropProductionError::NotFound => StatusCode::NOT_FOUND,
                CropProductionError::InvalidReference(_)
                | CropProductionError::Validation(_) => StatusCode::BAD_REQUEST,
                CropProductionError::Database(_) | CropProductionError::Export(_) => INTERNAL,
            },
            ApiError::LivestockPrice(err) => match err {
                LivestockPriceError::Privilege(e) => privilege_status(e),
                LivestockPriceError::NotFound => StatusCode::NOT_FOUND,
                LivestockPriceError::Validation(_) => StatusCode::BAD_REQUEST,
                LivestockPriceError::Database(_) | LivestockPriceError::Export(_) => INTERNAL,
            },
            ApiError::UserManagement(err) => match err {
                UserManagementError::Privilege(e) => privilege_status(e),
                UserManagementError::ProtectedUser => StatusCode::FORBIDDEN,
                UserManagementError::DuplicateUser(_) | UserManagementError::DuplicateRole(_) => {
                    StatusCode::CONFLICT
                }
                UserManagementError::UserNotFound | UserManagementError::RoleNotFound => {
                    StatusCode::NOT_FOUND
                }
                UserManagementError::UnknownPrivilege(_)
                | UserManagementError::Validation(_)
                | UserManagementError::Password(PasswordError::TooShort) => StatusCode::BAD_REQUEST,
                UserManagementError::Password(PasswordError::Hashing(_))
                | UserManagementError::Database(_)
                | UserManagementError::Export(ExportError::Xlsx(_)) => INTERNAL,
            },
            ApiError::ActivityLog(err) => match err {
                ActivityLogError::Privilege(e) => privilege_status(e),
                ActivityLogError::Database(_) => INTERNAL,
            },
            ApiError::Deployment(_) | ApiError::Database(_) => INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = if status_code.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let response = ApiResponse::<()>::error(&message);
        (status_code, Json(response)).into_response()
    }
}
