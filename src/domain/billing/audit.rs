//! Audit trail of processed payment events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{AuditEntryId, Timestamp, UserId};

/// Outcome recorded for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Error,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Error => "error",
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only row of `payment_event_log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub event_id: String,
    pub event_type: String,
    pub outcome: AuditOutcome,
    pub user_id: Option<UserId>,
    pub details: Value,
    /// 1 for the first delivery of an event id, 2 for the first retry, ...
    pub delivery_attempt: u32,
    pub logged_at: Timestamp,
}

impl AuditEntry {
    /// Starts an entry for a successfully processed event.
    pub fn success(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self::new(event_id, event_type, AuditOutcome::Success)
    }

    /// Starts an entry for an event that failed processing.
    pub fn error(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self::new(event_id, event_type, AuditOutcome::Error)
    }

    fn new(event_id: impl Into<String>, event_type: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            id: AuditEntryId::new(),
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome,
            user_id: None,
            details: Value::Object(Default::default()),
            delivery_attempt: 1,
            logged_at: Timestamp::now(),
        }
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Adds one key to the details object.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.details {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn with_delivery_attempt(mut self, attempt: u32) -> Self {
        self.delivery_attempt = attempt.max(1);
        self
    }
}
