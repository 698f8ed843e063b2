use db::models::activity_log::{ActivityLog, ActivityLogFilter};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::{
    privilege::{Access, PrivilegeError, PrivilegeService, Resource},
    request::ListRequest,
    session::SessionUser,
};

#[derive(Debug, Error)]
pub enum ActivityLogError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
}

/// Audit trail of user actions
pub struct ActivityLogService;

impl ActivityLogService {
    /// Append one entry. Called after the operation it describes succeeded.
    pub async fn record(
        pool: &SqlitePool,
        user_uuid: Option<Uuid>,
        activity: impl AsRef<str>,
    ) -> Result<(), sqlx::Error> {
        let entry = ActivityLog::create(pool, user_uuid, activity.as_ref()).await?;
        debug!(log_id = %entry.id, user_uuid = ?user_uuid, "Activity recorded");
        Ok(())
    }

    pub async fn list(
        pool: &SqlitePool,
        user: &SessionUser,
        request: &ListRequest<ActivityLogFilter>,
    ) -> Result<Vec<ActivityLog>, ActivityLogError> {
        PrivilegeService::require(pool, user, Resource::ActivityLog, Access::Read).await?;
        Ok(ActivityLog::find_filtered(
            pool,
            &request.filter,
            request.page.limit(),
            request.page.offset(),
        )
        .await?)
    }

    pub async fn count(
        pool: &SqlitePool,
        user: &SessionUser,
        filter: &ActivityLogFilter,
    ) -> Result<i64, ActivityLogError> {
        PrivilegeService::require(pool, user, Resource::ActivityLog, Access::Read).await?;
        Ok(ActivityLog::count_filtered(pool, filter).await?)
    }
}
