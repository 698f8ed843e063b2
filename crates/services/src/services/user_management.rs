//! Users and roles administration, plus first-start bootstrap of a super
//! admin account.

use db::{
    is_unique_violation,
    models::{
        pagination::NO_LIMIT,
        user::{NewUser, RegisterType, UpdateUser, User, UserFilter},
        user_role::{CreateUserRole, UpdateUserRole, UserRole, UserRoleView},
        user_session::UserSession,
    },
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity_log::ActivityLogService,
    config::BootstrapAdmin,
    export::{Cell, ExportError, ExportFile, Sheet, export_sheet},
    password::{PasswordError, hash_password},
    privilege::{Access, PrivilegeError, PrivilegeService, Resource, known_privileges},
    request::{
        DeleteRequest, DeleteResult, ListRequest, UpdateRequest, clearable_text, optional_text,
        required_text,
    },
    session::SessionUser,
};

#[derive(Debug, Error)]
pub enum UserManagementError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("User {0} already exists")]
    DuplicateUser(String),
    #[error("Role {0} already exists")]
    DuplicateRole(String),
    #[error("Unknown privilege {0}")]
    UnknownPrivilege(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Role not found")]
    RoleNotFound,
    #[error("Only a super admin can modify a super admin account")]
    ProtectedUser,
    #[error("{0}")]
    Validation(String),
}

impl From<String> for UserManagementError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub password: String,
    pub employee_id: Option<String>,
    #[serde(default)]
    pub register_type: RegisterType,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ResetPasswordRequest {
    pub id: Uuid,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ResetPasswordResult {
    /// Sessions of the user that were logged out by the reset
    #[ts(type = "number")]
    pub ended_sessions: u64,
}

const EXPORT_HEADERS: &[&str] = &["User ID", "Employee ID", "Register Type", "Role", "Status"];

/// Only a super admin may hand out super admin rights.
fn guard_register_type(
    actor: &SessionUser,
    register_type: Option<RegisterType>,
) -> Result<(), UserManagementError> {
    if register_type == Some(RegisterType::SuperAdmin)
        && actor.register_type != RegisterType::SuperAdmin
    {
        return Err(UserManagementError::Validation(
            "Only a super admin can grant super admin rights".to_string(),
        ));
    }
    Ok(())
}

/// Super admin accounts are managed by super admins only.
fn guard_target(actor: &SessionUser, target: &User) -> Result<(), UserManagementError> {
    if target.register_type == RegisterType::SuperAdmin
        && actor.register_type != RegisterType::SuperAdmin
    {
        return Err(UserManagementError::ProtectedUser);
    }
    Ok(())
}

fn check_privileges(privileges: &[String]) -> Result<Vec<String>, UserManagementError> {
    let known = known_privileges();
    let mut checked: Vec<String> = Vec::with_capacity(privileges.len());
    for privilege in privileges {
        let privilege = privilege.trim();
        if !known.iter().any(|k| k == privilege) {
            return Err(UserManagementError::UnknownPrivilege(privilege.to_string()));
        }
        if !checked.iter().any(|c| c == privilege) {
            checked.push(privilege.to_string());
        }
    }
    Ok(checked)
}

async fn ensure_role_exists(pool: &SqlitePool, role_id: Option<Uuid>) -> Result<(), UserManagementError> {
    if let Some(role_id) = role_id {
        UserRole::find_by_id(pool, role_id)
            .await?
            .ok_or(UserManagementError::RoleNotFound)?;
    }
    Ok(())
}

pub struct UserManagementService;

impl UserManagementService {
    pub async fn list_users(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &ListRequest<UserFilter>,
    ) -> Result<Vec<User>, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Read).await?;
        Ok(User::find_filtered(
            pool,
            &request.filter,
            request.page.limit(),
            request.page.offset(),
        )
        .await?)
    }

    pub async fn count_users(
        pool: &SqlitePool,
        actor: &SessionUser,
        filter: &UserFilter,
    ) -> Result<i64, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Read).await?;
        Ok(User::count_filtered(pool, filter).await?)
    }

    pub async fn create_user(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &CreateUserRequest,
    ) -> Result<User, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Write).await?;
        guard_register_type(actor, Some(request.register_type))?;

        let user_id = required_text("User ID", &request.user_id)?;
        if User::find_by_user_id(pool, &user_id).await?.is_some() {
            return Err(UserManagementError::DuplicateUser(user_id));
        }
        ensure_role_exists(pool, request.role_id).await?;

        let new_user = NewUser {
            password_hash: hash_password(&request.password)?,
            employee_id: optional_text(request.employee_id.clone()),
            register_type: request.register_type,
            role_id: request.role_id,
            user_id,
        };
        let user = User::create(pool, &new_user, Uuid::new_v4())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserManagementError::DuplicateUser(new_user.user_id.clone())
                } else {
                    UserManagementError::Database(e)
                }
            })?;

        ActivityLogService::record(pool, Some(actor.uuid), format!("Created user {}", user.user_id))
            .await?;
        info!(user_uuid = %actor.uuid, id = %user.id, "User created");
        Ok(user)
    }

    pub async fn update_user(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &UpdateRequest<UpdateUser>,
    ) -> Result<User, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Write).await?;
        guard_register_type(actor, request.changes.register_type)?;
        let existing = User::find_by_id(pool, request.id)
            .await?
            .ok_or(UserManagementError::UserNotFound)?;
        guard_target(actor, &existing)?;
        ensure_role_exists(pool, request.changes.role_id).await?;

        let changes = UpdateUser {
            employee_id: clearable_text(&request.changes.employee_id),
            ..request.changes.clone()
        };
        let user = User::update(pool, request.id, &changes)
            .await?
            .ok_or(UserManagementError::UserNotFound)?;

        ActivityLogService::record(pool, Some(actor.uuid), format!("Updated user {}", user.user_id))
            .await?;
        info!(user_uuid = %actor.uuid, id = %user.id, "User updated");
        Ok(user)
    }

    /// Set a new password and log the user out everywhere
    pub async fn reset_password(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &ResetPasswordRequest,
    ) -> Result<ResetPasswordResult, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Write).await?;
        let user = User::find_by_id(pool, request.id)
            .await?
            .ok_or(UserManagementError::UserNotFound)?;
        guard_target(actor, &user)?;

        let password_hash = hash_password(&request.password)?;
        User::update_password_hash(pool, user.id, &password_hash).await?;
        let ended_sessions = UserSession::end_all_for_user(pool, user.id).await?;

        ActivityLogService::record(
            pool,
            Some(actor.uuid),
            format!("Reset password of user {}", user.user_id),
        )
        .await?;
        info!(user_uuid = %actor.uuid, id = %user.id, ended_sessions, "Password reset");
        Ok(ResetPasswordResult { ended_sessions })
    }

    /// Deletes one id at a time; rows removed before a failure stay removed.
    pub async fn delete_users(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &DeleteRequest,
    ) -> Result<DeleteResult, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Write).await?;
        if request.ids.is_empty() {
            return Err(UserManagementError::Validation("ids cannot be empty".to_string()));
        }
        if request.ids.contains(&actor.uuid) {
            return Err(UserManagementError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }
        for id in &request.ids {
            if let Some(target) = User::find_by_id(pool, *id).await? {
                guard_target(actor, &target)?;
            }
        }

        let mut deleted = 0;
        for id in &request.ids {
            if User::delete(pool, *id).await? > 0 {
                deleted += 1;
                ActivityLogService::record(pool, Some(actor.uuid), format!("Deleted user {id}"))
                    .await?;
            }
        }

        info!(user_uuid = %actor.uuid, deleted, "Users deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn export_users(
        pool: &SqlitePool,
        actor: &SessionUser,
        filter: &UserFilter,
    ) -> Result<ExportFile, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::User, Access::Export).await?;
        let roles = UserRole::find_all(pool).await?;
        let role_name = |role_id: Option<Uuid>| {
            role_id.and_then(|id| roles.iter().find(|r| r.id == id).map(|r| r.name.clone()))
        };

        let rows: Vec<Vec<Cell>> = User::find_filtered(pool, filter, NO_LIMIT, 0)
            .await?
            .into_iter()
            .map(|u| {
                vec![
                    u.user_id.into(),
                    u.employee_id.into(),
                    u.register_type.to_string().into(),
                    role_name(u.role_id).into(),
                    u.status.to_string().into(),
                ]
            })
            .collect();
        let row_count = rows.len();

        let file = export_sheet(
            "users",
            &Sheet {
                name: "Users",
                headers: EXPORT_HEADERS,
                rows,
            },
        )?;
        ActivityLogService::record(pool, Some(actor.uuid), format!("Exported {row_count} users"))
            .await?;
        Ok(file)
    }

    pub async fn list_roles(
        pool: &SqlitePool,
        actor: &SessionUser,
    ) -> Result<Vec<UserRoleView>, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::UserRole, Access::Read).await?;
        Ok(UserRole::find_all(pool)
            .await?
            .into_iter()
            .map(UserRoleView::from)
            .collect())
    }

    pub async fn create_role(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &CreateUserRole,
    ) -> Result<UserRoleView, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::UserRole, Access::Write).await?;
        let data = CreateUserRole {
            name: required_text("Role name", &request.name)?,
            privileges: check_privileges(&request.privileges)?,
        };
        if UserRole::find_by_name(pool, &data.name).await?.is_some() {
            return Err(UserManagementError::DuplicateRole(data.name));
        }

        let role = UserRole::create(pool, &data, Uuid::new_v4())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserManagementError::DuplicateRole(data.name.clone())
                } else {
                    UserManagementError::Database(e)
                }
            })?;

        ActivityLogService::record(pool, Some(actor.uuid), format!("Created role {}", role.name))
            .await?;
        info!(user_uuid = %actor.uuid, id = %role.id, "Role created");
        Ok(role.into())
    }

    pub async fn update_role(
        pool: &SqlitePool,
        actor: &SessionUser,
        request: &UpdateRequest<UpdateUserRole>,
    ) -> Result<UserRoleView, UserManagementError> {
        PrivilegeService::require(pool, actor, Resource::UserRole, Access::Write).await?;
        let changes = UpdateUserRole {
            name: request
                .changes
                .name
                .as_deref()
                .map(|name| required_text("Role name", name))
                .transpose()?,
            privileges: request
                .changes
                .privileges
                .as_deref()
                .map(check_privileges)
                .transpose()?,
        };

        let existing = UserRole::find_by_id(pool, request.id)
            .await?
            .ok_or(UserManagementError::RoleNotFound)?;
        if let Some(name) = changes.name.as_deref() {
            if name != existing.name && UserRole::find_by_name(pool, name).await?.is_some() {
                return Err(UserManagementError::DuplicateRole(name.to_string()));
            }
        }

        let role = UserRole::update(pool, request.id, &changes)
            .await?
            .ok_or(UserManagementError::RoleNotFound)?;
        ActivityLogService::record(pool, Some(actor.uuid), format!("Updated role {}", role.name))
            .await?;
        info!(user_uuid = %actor.uuid, id = %role.id, "Role updated");
        Ok(role.into())
    }

    /// Create the configured super admin when no user exists yet. Returns
    /// whether an account was created.
    pub async fn ensure_bootstrap_admin(
        pool: &SqlitePool,
        admin: &BootstrapAdmin,
    ) -> Result<bool, UserManagementError> {
        if User::count_all(pool).await? > 0 {
            return Ok(false);
        }

        let user_id = required_text("Bootstrap admin user", &admin.user_id)?;
        let new_user = NewUser {
            password_hash: hash_password(admin.password.expose_secret())?,
            employee_id: None,
            register_type: RegisterType::SuperAdmin,
            role_id: None,
            user_id,
        };
        let user = User::create(pool, &new_user, Uuid::new_v4()).await?;
        ActivityLogService::record(pool, None, format!("Bootstrapped super admin {}", user.user_id))
            .await?;
        info!(id = %user.id, "Bootstrap super admin created");
        Ok(true)
    }
}
