use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    pagination::Pagination,
    user::{UpdateUser, User, UserFilter},
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    export::ExportFile,
    request::{CountResult, DeleteRequest, DeleteResult, ListRequest, UpdateRequest},
    user_management::{
        CreateUserRequest, ResetPasswordRequest, ResetPasswordResult, UserManagementService,
    },
};
use ts_rs::TS;
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

#[derive(Debug, Deserialize, TS)]
pub struct NewPassword {
    pub password: String,
}

/// List user accounts matching the query filter, one page at a time
pub async fn all_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<UserFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let request = ListRequest { filter, page };
    let users =
        UserManagementService::list_users(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// Count user accounts matching the query filter
pub async fn count_all_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<UserFilter>,
) -> Result<ResponseJson<ApiResponse<CountResult>>, ApiError> {
    let count =
        UserManagementService::count_users(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(CountResult { count })))
}

/// Create a user account
pub async fn create_user(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user =
        UserManagementService::create_user(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Update the user account at `id`; absent fields keep their value
pub async fn update_user(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let user =
        UserManagementService::update_user(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Set a new password for the user at `id` and end their sessions
pub async fn reset_user_password(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(body): Json<NewPassword>,
) -> Result<ResponseJson<ApiResponse<ResetPasswordResult>>, ApiError> {
    let request = ResetPasswordRequest {
        id,
        password: body.password,
    };
    let result =
        UserManagementService::reset_password(&deployment.db().pool, &session.user, &request)
            .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Delete the listed user accounts, reporting how many existed
pub async fn delete_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<DeleteRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let result =
        UserManagementService::delete_users(&deployment.db().pool, &session.user, &request)
            .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Export matching user accounts as an xlsx workbook
pub async fn export_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<UserFilter>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let file =
        UserManagementService::export_users(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// [`all_users`] with filter and paging read from a signed envelope
pub async fn tokenized_all_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let request: ListRequest<UserFilter> = body.decode(deployment.tokenizer())?;
    let users =
        UserManagementService::list_users(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// [`create_user`] from a signed envelope
pub async fn tokenized_create_user(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let payload: CreateUserRequest = body.decode(deployment.tokenizer())?;
    let user =
        UserManagementService::create_user(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// [`update_user`] from a signed envelope carrying `id` and the changes
pub async fn tokenized_update_user(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let request: UpdateRequest<UpdateUser> = body.decode(deployment.tokenizer())?;
    let user =
        UserManagementService::update_user(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// [`reset_user_password`] from a signed envelope
pub async fn tokenized_reset_user_password(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ResetPasswordResult>>, ApiError> {
    let request: ResetPasswordRequest = body.decode(deployment.tokenizer())?;
    let result =
        UserManagementService::reset_password(&deployment.db().pool, &session.user, &request)
            .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`delete_users`] from a signed envelope
pub async fn tokenized_delete_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<DeleteResult>>, ApiError> {
    let request: DeleteRequest = body.decode(deployment.tokenizer())?;
    let result =
        UserManagementService::delete_users(&deployment.db().pool, &session.user, &request)
            .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// [`export_users`] with the filter read from a signed envelope
pub async fn tokenized_export_users(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<ExportFile>>, ApiError> {
    let filter: UserFilter = body.decode(deployment.tokenizer())?;
    let file =
        UserManagementService::export_users(&deployment.db().pool, &session.user, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/users",
        Router::new()
            .route("/", get(all_users).post(create_user))
            .route("/count", get(count_all_users))
            .route("/export", get(export_users))
            .route("/delete", post(delete_users))
            .route("/{id}", put(update_user))
            .route("/{id}/reset-password", post(reset_user_password))
            .route("/tokenized/all", post(tokenized_all_users))
            .route("/tokenized/create", post(tokenized_create_user))
            .route("/tokenized/update", post(tokenized_update_user))
            .route("/tokenized/reset-password", post(tokenized_reset_user_password))
            .route("/tokenized/delete", post(tokenized_delete_users))
            .route("/tokenized/export", post(tokenized_export_users)),
    )
}
