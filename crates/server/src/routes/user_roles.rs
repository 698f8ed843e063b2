use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::user_role::{CreateUserRole, UpdateUserRole, UserRoleView};
use deployment::Deployment;
use services::services::{
    privilege::known_privileges, request::UpdateRequest, user_management::UserManagementService,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::TokenizedRequest;
use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{
        extract::{Json, Path},
        session::CurrentSession,
    },
};

/// List roles with their decoded privilege lists
pub async fn all_user_roles(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
) -> Result<ResponseJson<ApiResponse<Vec<UserRoleView>>>, ApiError> {
    let roles = UserManagementService::list_roles(&deployment.db().pool, &session.user).await?;
    Ok(ResponseJson(ApiResponse::success(roles)))
}

/// Every privilege string a role can be granted
pub async fn all_privileges(
    CurrentSession(_session): CurrentSession,
) -> ResponseJson<ApiResponse<Vec<String>>> {
    ResponseJson(ApiResponse::success(known_privileges()))
}

/// Create a role from known privilege strings
pub async fn create_user_role(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateUserRole>,
) -> Result<ResponseJson<ApiResponse<UserRoleView>>, ApiError> {
    let role =
        UserManagementService::create_role(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(role)))
}

/// Rename the role at `id` or replace its privileges
pub async fn update_user_role(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateUserRole>,
) -> Result<ResponseJson<ApiResponse<UserRoleView>>, ApiError> {
    let request = UpdateRequest { id, changes };
    let role =
        UserManagementService::update_role(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(role)))
}

/// [`create_user_role`] from a signed envelope
pub async fn tokenized_create_user_role(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<UserRoleView>>, ApiError> {
    let payload: CreateUserRole = body.decode(deployment.tokenizer())?;
    let role =
        UserManagementService::create_role(&deployment.db().pool, &session.user, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(role)))
}

/// [`update_user_role`] from a signed envelope
pub async fn tokenized_update_user_role(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<TokenizedRequest>,
) -> Result<ResponseJson<ApiResponse<UserRoleView>>, ApiError> {
    let request: UpdateRequest<UpdateUserRole> = body.decode(deployment.tokenizer())?;
    let role =
        UserManagementService::update_role(&deployment.db().pool, &session.user, &request).await?;
    Ok(ResponseJson(ApiResponse::success(role)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/user-roles",
        Router::new()
            .route("/", get(all_user_roles).post(create_user_role))
            .route("/privileges", get(all_privileges))
            .route("/{id}", put(update_user_role))
            .route("/tokenized/create", post(tokenized_create_user_role))
            .route("/tokenized/update", post(tokenized_update_user_role)),
    )
}
