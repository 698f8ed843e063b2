use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use deployment::Deployment;
use services::services::session::{LoginRequest, LoginResponse, SessionService, SessionUser};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{
        extract::{Json},
        session::CurrentSession,
    },
};

/// Exchange a user id and password for a bearer token
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(request): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let response = SessionService::login(&deployment.db().pool, &request).await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// End the session behind the bearer token
pub async fn logout(
    State(deployment): State<DeploymentImpl>,
    CurrentSession(session): CurrentSession,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    SessionService::logout(&deployment.db().pool, &session).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// The user behind the bearer token
pub async fn current_session(
    CurrentSession(session): CurrentSession,
) -> ResponseJson<ApiResponse<SessionUser>> {
    ResponseJson(ApiResponse::success(session.user))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/session", get(current_session)),
    )
}
