use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    crop_production::{
        CreateCropProduction, CropProduction, CropProductionFilter, CropProductionWithFarmer,
        UpdateCropProduction,
    },
    pagination::Pagination,
};
use deployment::Deployment;
use services::services::{
    export::ExportFile,
    crop_production::CropProductionService,
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

/// List crop production records matching the query filter, one page at a time
pub async fn all_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CropProductionFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<CropProductionWithFarmer>>>, ApiError> {
    let request = ListRequest { filter, page };
    let records =
        CropProductionService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(records)))
}

/// Count crop production records matching the query filter
pub async fn count_all_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CropProductionFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count = CropProductionService::count(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// Create a crop production record
pub async fn create_crop_production(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateCropProduction>,
) -> Result<ResponseJson<ApiResponse<CropProduction>>, ApiError> {
    let record =
        CropProductionService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(record)))
}

/// Update the crop production record at `id`; absent fields keep their value
pub async fn update_crop_production(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateCropProduction>,
) -> Result<ResponseJson<ApiResponse<CropProduction>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let record =
        CropProductionService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(record)))
}

/// Delete the listed crop production records, reporting how many existed
pub async fn delete_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<DeleteRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let result =
        CropProductionService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Export matching crop production records as an xlsx workbook
pub async fn export_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CropProductionFilter>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let file = CropProductionService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// [`all_crop_productions`] with filter and paging read from a signed envelope
pub async fn tokenized_all_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<CropProductionWithFarmer>>>, ApiError> {
    let request: ListRequest<CropProductionFilter> = body.decode(deployment.tokenizer())?;
    let records =
        CropProductionService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(records)))
}

/// [`create_crop_production`] from a signed envelope
pub async fn tokenized_create_crop_production(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<CropProduction>>, ApiError> {
    let payload: CreateCropProduction = body.decode(deployment.tokenizer())?;
    let record =
        CropProductionService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(record)))
}

/// [`update_crop_production`] from a signed envelope carrying `id` and the changes
pub async fn tokenized_update_crop_production(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<CropProduction>>, ApiError> {
    let request: UpdateRequest<UpdateCropProduction> = body.decode(deployment.tokenizer())?;
    let record =
        CropProductionService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(record)))
}

/// [`delete_crop_productions`] from a signed envelope
pub async fn tokenized_delete_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let request: DeleteRequest = body.decode(deployment.tokenizer())?;
    let result =
        CropProductionService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`export_crop_productions`] with the filter read from a signed envelope
pub async fn tokenized_export_crop_productions(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let filter: CropProductionFilter = body.decode(deployment.tokenizer())?;
    let file = CropProductionService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/crop-productions",
        Router::new()
            .route("/", get(all_crop_productions).post(create_crop_production))
            .route("/count", get(count_all_crop_productions))
            .route("/export", get(export_crop_productions))
            .route("/delete", post(delete_crop_productions))
            .route("/{id}", put(update_crop_production))
            .route("/tokenized/all", post(tokenized_all_crop_productions))
            .route("/tokenized/create", post(tokenized_create_crop_production))
            .route("/tokenized/update", post(tokenized_update_crop_production))
            .route("/tokenized/delete", post(tokenized_delete_crop_productions))
            .route("/tokenized/export", post(tokenized_export_crop_productions)),
    )
}
