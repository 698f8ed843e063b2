//! Role based privilege checks.
//!
//! A privilege is a `<resource>:<access>` string such as
//! `farmer_profile:write`. Roles carry an allow-list of these strings; super
//! admins pass every check.

use db::models::{user::RegisterType, user_role::UserRole};
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::warn;

use super::session::SessionUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    FarmerProfile,
    CompanyProfile,
    CropProduction,
    LivestockRetailPrice,
    User,
    UserRole,
    ActivityLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Access {
    Read,
    Write,
    Export,
}

#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("Forbidden: missing privilege {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub fn privilege_name(resource: Resource, access: Access) -> String {
    format!("{resource}:{access}")
}

/// Every privilege string a role may contain
pub fn known_privileges() -> Vec<String> {
    Resource::iter()
        .flat_map(|resource| Access::iter().map(move |access| privilege_name(resource, access)))
        .collect()
}

pub struct PrivilegeService;

impl PrivilegeService {
    pub async fn require(
        pool: &SqlitePool,
        user: &SessionUser,
        resource: Resource,
        access: Access,
    ) -> Result<(), PrivilegeError> {
        if user.register_type == RegisterType::SuperAdmin {
            return Ok(());
        }

        let privilege = privilege_name(resource, access);
        let role = match user.role_id {
            Some(role_id) => UserRole::find_by_id(pool, role_id).await?,
            None => None,
        };

        if role.is_some_and(|role| role.has_privilege(&privilege)) {
            Ok(())
        } else {
            warn!(user_uuid = %user.uuid, privilege = %privilege, "Privilege check failed");
            Err(PrivilegeError::Forbidden(privilege))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_names() {
        assert_eq!(
            privilege_name(Resource::LivestockRetailPrice, Access::Export),
            "livestock_retail_price:export"
        );
        assert_eq!(privilege_name(Resource::User, Access::Read), "user:read");
    }

    #[test]
    fn test_known_privileges_cover_every_pair() {
        let all = known_privileges();
        assert_eq!(all.len(), 7 * 3);
        assert!(all.contains(&"activity_log:read".to_string()));
    }
}
