use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    company_profile::{CreateCompanyProfile, CompanyProfile, CompanyProfileFilter, UpdateCompanyProfile},
    pagination::Pagination,
};
use deployment::Deployment;
use services::services::{
    export::ExportFile,
    company_profile::CompanyProfileService,
    request::{CountResult, DeleteRequest, DeleteResult, ListRequest, UpdateRequest},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::TokenizedRequest;
use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{
        extract::{Json, Path, Query},
        session::CurrentSession,
    },
};

/// List company profiles matching the query filter, one page at a time
pub async fn all_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CompanyProfileFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<CompanyProfile>>>, ApiError> {
    let request = ListRequest { filter, page };
    let profiles =
        CompanyProfileService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profiles)))
}

/// Count company profiles matching the query filter
pub async fn count_all_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CompanyProfileFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count = CompanyProfileService::count(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// Create a company profile
pub async fn create_company_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateCompanyProfile>,
) -> Result<ResponseJson<ApiResponse<CompanyProfile>>, ApiError> {
    let profile =
        CompanyProfileService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Update the company profile at `id`; absent fields keep their value
pub async fn update_company_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateCompanyProfile>,
) -> Result<ResponseJson<ApiResponse<CompanyProfile>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let profile =
        CompanyProfileService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Delete the listed company profiles, reporting how many existed
pub async fn delete_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<DeleteRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let result =
        CompanyProfileService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Export matching company profiles as an xlsx workbook
pub async fn export_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CompanyProfileFilter>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let file = CompanyProfileService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// [`all_company_profiles`] with filter and paging read from a signed envelope
pub async fn tokenized_all_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<CompanyProfile>>>, ApiError> {
    let request: ListRequest<CompanyProfileFilter> = body.decode(deployment.tokenizer())?;
    let profiles =
        CompanyProfileService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profiles)))
}

/// [`create_company_profile`] from a signed envelope
pub async fn tokenized_create_company_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<CompanyProfile>>, ApiError> {
    let payload: CreateCompanyProfile = body.decode(deployment.tokenizer())?;
    let profile =
        CompanyProfileService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// [`update_company_profile`] from a signed envelope carrying `id` and the changes
pub async fn tokenized_update_company_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<CompanyProfile>>, ApiError> {
    let request: UpdateRequest<UpdateCompanyProfile> = body.decode(deployment.tokenizer())?;
    let profile =
        CompanyProfileService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// [`delete_company_profiles`] from a signed envelope
pub async fn tokenized_delete_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let request: DeleteRequest = body.decode(deployment.tokenizer())?;
    let result =
        CompanyProfileService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`export_company_profiles`] with the filter read from a signed envelope
pub async fn tokenized_export_company_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let filter: CompanyProfileFilter = body.decode(deployment.tokenizer())?;
    let file = CompanyProfileService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/company-profiles",
        Router::new()
            .route("/", get(all_company_profiles).post(create_company_profile))
            .route("/count", get(count_all_company_profiles))
            .route("/export", get(export_company_profiles))
            .route("/delete", post(delete_company_profiles))
            .route("/{id}", put(update_company_profile))
            .route("/tokenized/all", post(tokenized_all_company_profiles))
            .route("/tokenized/create", post(tokenized_create_company_profile))
            .route("/tokenized/update", post(tokenized_update_company_profile))
            .route("/tokenized/delete", post(tokenized_delete_company_profiles))
            .route("/tokenized/export", post(tokenized_export_company_profiles)),
    )
}
