use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Serialize;
use services::services::database_validator::SchemaReport;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize, TS)]
pub struct HealthStatus {
    pub ok: bool,
    pub database: SchemaReport,
}

/// Database reachability and migration state; needs no session
pub async fn health_check(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    let database = deployment.schema_report().await?;
    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        ok: database.is_ok(),
        database,
    })))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health_check))
}
