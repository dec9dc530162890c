//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types used across the
//! billing domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AuditEntryId, UserId};
pub use timestamp::Timestamp;
