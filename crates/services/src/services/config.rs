//! Process configuration read from the environment at startup.

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://agridata.sqlite";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOKENIZE must be set to the shared payload signing secret")]
    MissingTokenizeSecret,
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// First administrator, created when the users table is empty
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub user_id: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tokenize_secret: SecretString,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub sentry_dsn: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let tokenize_secret = var("TOKENIZE")
            .map(SecretString::from)
            .ok_or(ConfigError::MissingTokenizeSecret)?;

        let port = match var("PORT").or_else(|| var("BACKEND_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PORT",
                    value: raw.clone(),
                })?,
            None => DEFAULT_PORT,
        };

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_USER"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(user_id), Some(password)) => Some(BootstrapAdmin {
                user_id,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        Ok(Self {
            tokenize_secret,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            sentry_dsn: var("SENTRY_DSN"),
            bootstrap_admin,
        })
    }
}
