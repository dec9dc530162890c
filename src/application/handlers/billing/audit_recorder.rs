//! AuditRecorder - best-effort writes to the payment event log.

use std::sync::Arc;

use crate::domain::billing::AuditEntry;
use crate::ports::AuditLog;

/// Wraps the [`AuditLog`] port so that audit failures never change the
/// outcome of event processing.
pub struct AuditRecorder {
    log: Arc<dyn AuditLog>,
}

impl AuditRecorder {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// 1-based attempt number for the next entry of `event_id`.
    pub async fn next_attempt(&self, event_id: &str) -> u32 {
        match self.log.entries_for_event(event_id).await {
            Ok(earlier) => u32::try_from(earlier.len())
                .unwrap_or(u32::MAX)
                .saturating_add(1),
            Err(e) => {
                tracing::warn!(event_id, error = %e, "Failed to count earlier audit entries");
                1
            }
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.log.append(&entry).await {
            tracing::warn!(
                event_id = %entry.event_id,
                event_type = %entry.event_type,
                outcome = %entry.outcome,
                error = %e,
                "Failed to append audit entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAuditLog;
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;

    struct BrokenLog;

    #[async_trait]
    impl AuditLog for BrokenLog {
        async fn append(&self, _entry: &AuditEntry) -> Result<(), DomainError> {
            Err(DomainError::database("down"))
        }

        async fn entries_for_event(&self, _event_id: &str) -> Result<Vec<AuditEntry>, DomainError> {
            Err(DomainError::database("down"))
        }
    }

    #[tokio::test]
    async fn attempt_counts_earlier_entries() {
        let log = Arc::new(InMemoryAuditLog::new());
        let recorder = AuditRecorder::new(log.clone());

        assert_eq!(recorder.next_attempt("evt_1").await, 1);
        recorder.record(AuditEntry::error("evt_1", "x")).await;
        assert_eq!(recorder.next_attempt("evt_1").await, 2);
        recorder.record(AuditEntry::success("evt_2", "x")).await;
        assert_eq!(recorder.next_attempt("evt_1").await, 2);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let recorder = AuditRecorder::new(Arc::new(BrokenLog));

        recorder.record(AuditEntry::success("evt_1", "x")).await;
        assert_eq!(recorder.next_attempt("evt_1").await, 1);
    }
}
