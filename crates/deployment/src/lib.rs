use anyhow::Error as AnyhowError;
use async_trait::async_trait;
use db::DBService;
use services::services::{
    config::{Config, ConfigError},
    database_validator::{DatabaseValidationError, DatabaseValidator, SchemaReport},
    user_management::{UserManagementError, UserManagementService},
};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing::info;
use utils::tokenize::Tokenizer;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error(transparent)]
    UserManagement(#[from] UserManagementError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

/// Everything a request handler needs, shared as axum state
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn tokenizer(&self) -> &Tokenizer;

    async fn schema_report(&self) -> Result<SchemaReport, DeploymentError> {
        Ok(DatabaseValidator::new(self.db().pool.clone())
            .report()
            .await?)
    }

    /// Validate the schema and create the bootstrap admin if configured.
    /// Run once after construction.
    async fn prepare(&self) -> Result<(), DeploymentError> {
        DatabaseValidator::new(self.db().pool.clone())
            .validate()
            .await?;

        if let Some(admin) = &self.config().bootstrap_admin {
            let created =
                UserManagementService::ensure_bootstrap_admin(&self.db().pool, admin).await?;
            if created {
                info!(user_id = %admin.user_id, "Created bootstrap super admin");
            }
        }
        Ok(())
    }
}
