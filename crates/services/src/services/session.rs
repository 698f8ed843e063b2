//! Login sessions. A session is an opaque random bearer token stored in
//! `user_sessions`; logging out stamps `logged_out_at` instead of deleting
//! the row.

use db::models::{
    user::{RegisterType, User},
    user_session::UserSession,
};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{activity_log::ActivityLogService, password::verify_password};

const TOKEN_LENGTH: usize = 48;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid Session")]
    InvalidSession,
    #[error("User Invalid")]
    UserInvalid,
    #[error("User already logged out")]
    AlreadyLoggedOut,
    #[error("Invalid user id or password")]
    InvalidCredentials,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// The caller as seen by handlers
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SessionUser {
    pub uuid: Uuid,
    pub user_id: String,
    pub employee_id: Option<String>,
    pub register_type: RegisterType,
    pub role_id: Option<Uuid>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            uuid: user.id,
            user_id: user.user_id.clone(),
            employee_id: user.employee_id.clone(),
            register_type: user.register_type,
            role_id: user.role_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: Uuid,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub struct SessionService;

impl SessionService {
    pub async fn login(
        pool: &SqlitePool,
        request: &LoginRequest,
    ) -> Result<LoginResponse, SessionError> {
        let user = User::find_by_user_id(pool, request.user_id.trim())
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash) {
            warn!(user_uuid = %user.id, "Login rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }
        if !user.is_active() {
            warn!(user_uuid = %user.id, "Login rejected: inactive user");
            return Err(SessionError::UserInvalid);
        }

        let token = generate_token();
        UserSession::create(pool, user.id, &token).await?;
        ActivityLogService::record(pool, Some(user.id), "Logged in").await?;
        info!(user_uuid = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            user: SessionUser::from(&user),
        })
    }

    /// Resolve a bearer token to the session and its user
    pub async fn validate(pool: &SqlitePool, token: &str) -> Result<ActiveSession, SessionError> {
        let session = UserSession::find_by_token(pool, token)
            .await?
            .ok_or(SessionError::InvalidSession)?;
        if session.is_logged_out() {
            return Err(SessionError::AlreadyLoggedOut);
        }

        let user = User::find_by_id(pool, session.user_uuid)
            .await?
            .filter(User::is_active)
            .ok_or(SessionError::UserInvalid)?;

        Ok(ActiveSession {
            session_id: session.id,
            user: SessionUser::from(&user),
        })
    }

    pub async fn logout(pool: &SqlitePool, session: &ActiveSession) -> Result<(), SessionError> {
        UserSession::mark_logged_out(pool, session.session_id).await?;
        ActivityLogService::record(pool, Some(session.user.uuid), "Logged out").await?;
        info!(user_uuid = %session.user.uuid, "User logged out");
        Ok(())
    }
}
