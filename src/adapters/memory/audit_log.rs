//! In-memory implementation of `AuditLog`.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::AuditEntry;
use crate::domain::foundation::DomainError;
use crate::ports::AuditLog;

/// Append-only vector of audit entries.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for_event(&self, event_id: &str) -> Result<Vec<AuditEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_entries_per_event() {
        let log = InMemoryAuditLog::new();
        log.append(&AuditEntry::success("evt_1", "a")).await.unwrap();
        log.append(&AuditEntry::error("evt_1", "a").with_delivery_attempt(2))
            .await
            .unwrap();
        log.append(&AuditEntry::success("evt_2", "b")).await.unwrap();

        let history = log.entries_for_event("evt_1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].delivery_attempt, 2);
        assert!(log.entries_for_event("evt_3").await.unwrap().is_empty());
        assert_eq!(log.len().await, 3);
    }
}
