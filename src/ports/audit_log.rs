//! Audit log port.
//!
//! Append-only store of processed payment events (`payment_event_log`).
//! Entries are never updated or deleted.

use crate::domain::billing::AuditEntry;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Port for the payment event audit trail.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError>;

    /// Entries already stored for an event id, oldest first.
    ///
    /// Used to flag provider redeliveries; it never blocks processing.
    async fn entries_for_event(&self, event_id: &str) -> Result<Vec<AuditEntry>, DomainError>;
}
