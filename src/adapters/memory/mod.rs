//! In-memory adapters.
//!
//! Used by tests and by the server when no database is configured.

mod audit_log;
mod user_repository;

pub use audit_log::InMemoryAuditLog;
pub use user_repository::InMemoryUserRepository;
