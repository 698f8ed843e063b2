use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    activity_log::{ActivityLog, ActivityLogFilter},
    pagination::Pagination,
};
use deployment::Deployment;
use services::services::{
    activity_log::ActivityLogService,
    request::{CountResult, ListRequest},
};
use utils::response::ApiResponse;

use super::TokenizedRequest;
use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{
        extract::{Json, Query},
        session::CurrentSession,
    },
};

/// List audit entries, newest first
pub async fn all_activity_logs(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<ActivityLogFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    let request = ListRequest { filter, page };
    let logs = ActivityLogService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(logs)))
}

/// Count audit entries matching the query filter
pub async fn count_all_activity_logs(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<ActivityLogFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count = ActivityLogService::count(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// [`all_activity_logs`] with filter and paging read from a signed envelope
pub async fn tokenized_all_activity_logs(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    let request: ListRequest<ActivityLogFilter> = body.decode(deployment.tokenizer())?;
    let logs = ActivityLogService::list(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(logs)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/activity-logs",
        Router::new()
            .route("/", get(all_activity_logs))
            .route("/count", get(count_all_activity_logs))
            .route("/tokenized/all", post(tokenized_all_activity_logs)),
    )
}
