use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use deployment::Deployment;
use services::services::session::{ActiveSession, SessionError, SessionService};

use crate::{DeploymentImpl, error::ApiError};

/// The validated session of the caller, from `Authorization: Bearer <token>`
pub struct CurrentSession(pub ActiveSession);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<DeploymentImpl> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(SessionError::InvalidSession)?;
        let session = SessionService::validate(&deployment.db().pool, token).await?;
        Ok(Self(session))
    }
}
