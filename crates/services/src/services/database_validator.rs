//! Startup and health check of the SQLite schema

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

/// Tables every handler relies on
pub const REQUIRED_TABLES: &[&str] = &[
    "user_roles",
    "users",
    "user_sessions",
    "activity_logs",
    "farmer_profiles",
    "company_profiles",
    "crop_productions",
    "livestock_retail_prices",
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database schema incomplete: {0}")]
    Incomplete(String),
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct SchemaReport {
    pub migrations_applied: usize,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
    pub foreign_keys_enabled: bool,
}

impl SchemaReport {
    pub fn is_ok(&self) -> bool {
        self.migrations_applied > 0 && self.missing_tables.is_empty() && self.foreign_keys_enabled
    }

    pub fn summary(&self) -> String {
        if self.migrations_applied == 0 {
            "Database not initialized - no migrations applied".to_string()
        } else if !self.missing_tables.is_empty() {
            format!("Missing tables: {}", self.missing_tables.join(", "))
        } else if !self.foreign_keys_enabled {
            "Foreign key enforcement is off".to_string()
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn report(&self) -> Result<SchemaReport, DatabaseValidationError> {
        let migrations_table = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
        )
        .fetch_one(&self.pool)
        .await?
            > 0;

        let (migrations_applied, latest_migration) = if migrations_table {
            let applied = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
            )
            .fetch_one(&self.pool)
            .await?;
            let latest = sqlx::query_scalar::<_, String>(
                "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await?;
            (applied as usize, latest)
        } else {
            (0, None)
        };

        let mut missing_tables = Vec::new();
        for table in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?
                > 0;
            if !exists {
                missing_tables.push(table.to_string());
            }
        }

        let foreign_keys_enabled = sqlx::query_scalar::<_, i64>("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await?
            == 1;

        Ok(SchemaReport {
            migrations_applied,
            latest_migration,
            missing_tables,
            foreign_keys_enabled,
        })
    }

    /// Fail when the schema cannot serve requests
    pub async fn validate(&self) -> Result<SchemaReport, DatabaseValidationError> {
        let report = self.report().await?;
        if !report.is_ok() {
            warn!(summary = %report.summary(), "Database validation failed");
            return Err(DatabaseValidationError::Incomplete(report.summary()));
        }
        info!(
            migrations_applied = report.migrations_applied,
            latest = ?report.latest_migration,
            "Database validation complete"
        );
        Ok(report)
    }
}
