use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    livestock_price::{
        CreateLivestockRetailPrice, LivestockRetailPrice, LivestockRetailPriceFilter,
        UpdateLivestockRetailPrice,
    },
    pagination::Pagination,
};
use deployment::Deployment;
use services::services::{
    export::ExportFile,
    livestock_price::{ImportLivestockRetailPrices, ImportResult, LivestockPriceService},
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

/// List livestock retail prices matching the query filter, one page at a time
pub async fn all_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<LivestockRetailPriceFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<LivestockRetailPrice>>>, ApiError> {
    let request = ListRequest { filter, page };
    let prices =
        LivestockPriceService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(prices)))
}

/// Count livestock retail prices matching the query filter
pub async fn count_all_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<LivestockRetailPriceFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count = LivestockPriceService::count(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// Create a livestock retail price
pub async fn create_livestock_retail_price(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateLivestockRetailPrice>,
) -> Result<ResponseJson<ApiResponse<LivestockRetailPrice>>, ApiError> {
    let price =
        LivestockPriceService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(price)))
}

/// Update the livestock retail price at `id`; absent fields keep their value
pub async fn update_livestock_retail_price(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateLivestockRetailPrice>,
) -> Result<ResponseJson<ApiResponse<LivestockRetailPrice>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let price =
        LivestockPriceService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(price)))
}

/// Delete the listed livestock retail prices, reporting how many existed
pub async fn delete_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<DeleteRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let result =
        LivestockPriceService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Export matching livestock retail prices as an xlsx workbook
pub async fn export_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<LivestockRetailPriceFilter>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let file = LivestockPriceService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// [`all_livestock_retail_prices`] with filter and paging read from a signed envelope
pub async fn tokenized_all_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<LivestockRetailPrice>>>, ApiError> {
    let request: ListRequest<LivestockRetailPriceFilter> = body.decode(deployment.tokenizer())?;
    let prices =
        LivestockPriceService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(prices)))
}

/// [`create_livestock_retail_price`] from a signed envelope
pub async fn tokenized_create_livestock_retail_price(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<LivestockRetailPrice>>, ApiError> {
    let payload: CreateLivestockRetailPrice = body.decode(deployment.tokenizer())?;
    let price =
        LivestockPriceService::create(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(price)))
}

/// [`update_livestock_retail_price`] from a signed envelope carrying `id` and the changes
pub async fn tokenized_update_livestock_retail_price(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<LivestockRetailPrice>>, ApiError> {
    let request: UpdateRequest<UpdateLivestockRetailPrice> = body.decode(deployment.tokenizer())?;
    let price =
        LivestockPriceService::update(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(price)))
}

/// [`delete_livestock_retail_prices`] from a signed envelope
pub async fn tokenized_delete_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let request: DeleteRequest = body.decode(deployment.tokenizer())?;
    let result =
        LivestockPriceService::delete(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`export_livestock_retail_prices`] with the filter read from a signed envelope
pub async fn tokenized_export_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let filter: LivestockRetailPriceFilter = body.decode(deployment.tokenizer())?;
    let file = LivestockPriceService::export(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// Batch insert of rows parsed client-side from a spreadsheet upload
pub async fn tokenized_import_livestock_retail_prices(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ImportResult>>, ApiError> {
    let request: ImportLivestockRetailPrices = body.decode(deployment.tokenizer())?;
    let result =
        LivestockPriceService::import(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/livestock-retail-prices",
        Router::new()
            .route("/", get(all_livestock_retail_prices).post(create_livestock_retail_price))
            .route("/count", get(count_all_livestock_retail_prices))
            .route("/export", get(export_livestock_retail_prices))
            .route("/delete", post(delete_livestock_retail_prices))
            .route("/{id}", put(update_livestock_retail_price))
            .route("/tokenized/all", post(tokenized_all_livestock_retail_prices))
            .route("/tokenized/create", post(tokenized_create_livestock_retail_price))
            .route("/tokenized/update", post(tokenized_update_livestock_retail_price))
            .route("/tokenized/delete", post(tokenized_delete_livestock_retail_prices))
            .route("/tokenized/export", post(tokenized_export_livestock_retail_prices))
            .route("/tokenized/import", post(tokenized_import_livestock_retail_prices)),
    )
}
