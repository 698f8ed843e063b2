use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    farmer_profile::{CreateFarmerProfile, FarmerProfile, FarmerProfileFilter, UpdateFarmerProfile},
    pagination::Pagination,
};
use deployment::Deployment;
use services::services::{
    export::ExportFile,
    farmer_profile::FarmerProfileService,
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

/// List farmer profiles matching the query filter, one page at a time
pub async fn all_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<FarmerProfileFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<FarmerProfile>>>, ApiError> {
    let request = ListRequest { filter, page };
    let profiles =
        FarmerProfileService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profiles)))
}

/// Count farmer profiles matching the query filter
pub async fn count_all_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<FarmerProfileFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count = FarmerProfileService::count(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// Create a farmer profile
pub async fn create_farmer_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateFarmerProfile>,
) -> Result<ResponseJson<ApiResponse<FarmerProfile>>, ApiError> {
    let profile =
        FarmerProfileService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Update the farmer profile at `id`; absent fields keep their value
pub async fn update_farmer_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateFarmerProfile>,
) -> Result<ResponseJson<ApiResponse<FarmerProfile>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let profile =
        FarmerProfileService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Delete the listed farmer profiles, reporting how many existed
pub async fn delete_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<DeleteRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let result =
        FarmerProfileService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Export matching farmer profiles as an xlsx workbook
pub async fn export_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<FarmerProfileFilter>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let file = FarmerProfileService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// [`all_farmer_profiles`] with filter and paging read from a signed envelope
pub async fn tokenized_all_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<FarmerProfile>>>, ApiError> {
    let request: ListRequest<FarmerProfileFilter> = body.decode(deployment.tokenizer())?;
    let profiles =
        FarmerProfileService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profiles)))
}

/// [`create_farmer_profile`] from a signed envelope
pub async fn tokenized_create_farmer_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<FarmerProfile>>, ApiError> {
    let payload: CreateFarmerProfile = body.decode(deployment.tokenizer())?;
    let profile =
        FarmerProfileService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// [`update_farmer_profile`] from a signed envelope carrying `id` and the changes
pub async fn tokenized_update_farmer_profile(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<FarmerProfile>>, ApiError> {
    let request: UpdateRequest<UpdateFarmerProfile> = body.decode(deployment.tokenizer())?;
    let profile =
        FarmerProfileService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// [`delete_farmer_profiles`] from a signed envelope
pub async fn tokenized_delete_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let request: DeleteRequest = body.decode(deployment.tokenizer())?;
    let result =
        FarmerProfileService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`export_farmer_profiles`] with the filter read from a signed envelope
pub async fn tokenized_export_farmer_profiles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let filter: FarmerProfileFilter = body.decode(deployment.tokenizer())?;
    let file = FarmerProfileService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/farmer-profiles",
        Router::new()
            .route("/", get(all_farmer_profiles).post(create_farmer_profile))
            .route("/count", get(count_all_farmer_profiles))
            .route("/export", get(export_farmer_profiles))
            .route("/delete", post(delete_farmer_profiles))
            .route("/{id}", put(update_farmer_profile))
            .route("/tokenized/all", post(tokenized_all_farmer_profiles))
            .route("/tokenized/create", post(tokenized_create_farmer_profile))
            .route("/tokenized/update", post(tokenized_update_farmer_profile))
            .route("/tokenized/delete", post(tokenized_delete_farmer_profiles))
            .route("/tokenized/export", post(tokenized_export_farmer_profiles)),
    )
}
