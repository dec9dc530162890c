//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresUserRepository` - `users` JSONB documents with merge-writes
//! - `PostgresAuditLog` - append-only `payment_event_log`

mod audit_log;
mod user_repository;

pub use audit_log::PostgresAuditLog;
pub use user_repository::PostgresUserRepository;

use std::path::Path;

use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;

/// Applies the SQL migrations found in `dir`.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), DomainError> {
    let migrator = Migrator::new(dir)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load migrations: {}", e)))?;
    migrator
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}
