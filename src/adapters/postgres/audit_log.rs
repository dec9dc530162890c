//! PostgreSQL implementation of AuditLog (`payment_event_log`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{AuditEntry, AuditOutcome};
use crate::domain::foundation::{AuditEntryId, DomainError, Timestamp, UserId};
use crate::ports::AuditLog;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    event_id: String,
    event_type: String,
    outcome: String,
    user_id: Option<String>,
    details: Json<Value>,
    delivery_attempt: i32,
    logged_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: AuditEntryId::from_uuid(row.id),
            event_id: row.event_id,
            event_type: row.event_type,
            outcome: parse_outcome(&row.outcome)?,
            user_id: row.user_id.map(UserId::new).transpose()?,
            details: row.details.0,
            delivery_attempt: u32::try_from(row.delivery_attempt).unwrap_or(1),
            logged_at: Timestamp::from_datetime(row.logged_at),
        })
    }
}

fn parse_outcome(s: &str) -> Result<AuditOutcome, DomainError> {
    match s {
        "success" => Ok(AuditOutcome::Success),
        "error" => Ok(AuditOutcome::Error),
        other => Err(DomainError::database(format!("Invalid outcome value: {}", other))),
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_event_log (
                id, event_id, event_type, outcome, user_id, details, delivery_attempt, logged_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.event_id)
        .bind(&entry.event_type)
        .bind(entry.outcome.as_str())
        .bind(entry.user_id.as_ref().map(UserId::as_str))
        .bind(Json(&entry.details))
        .bind(i32::try_from(entry.delivery_attempt).unwrap_or(i32::MAX))
        .bind(entry.logged_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append audit entry: {}", e)))?;

        Ok(())
    }

    async fn entries_for_event(&self, event_id: &str) -> Result<Vec<AuditEntry>, DomainError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, event_type, outcome, user_id, details, delivery_attempt, logged_at
            FROM payment_event_log
            WHERE event_id = $1
            ORDER BY logged_at, delivery_attempt
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load audit entries: {}", e)))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(outcome: &str, user_id: Option<&str>, delivery_attempt: i32) -> AuditRow {
        AuditRow {
            id: Uuid::new_v4(),
            event_id: "evt_1".to_string(),
            event_type: "invoice.payment_failed".to_string(),
            outcome: outcome.to_string(),
            user_id: user_id.map(str::to_string),
            details: Json(json!({ "handled": true })),
            delivery_attempt,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn parse_outcome_accepts_stored_values() {
        assert_eq!(parse_outcome("success").unwrap(), AuditOutcome::Success);
        assert_eq!(parse_outcome("error").unwrap(), AuditOutcome::Error);
    }

    #[test]
    fn parse_outcome_rejects_unknown_values() {
        assert!(parse_outcome("skipped").is_err());
        assert!(parse_outcome("Success").is_err());
    }

    #[test]
    fn row_converts_to_entry() {
        let source = row("error", Some("u1"), 3);
        let id = source.id;

        let entry = AuditEntry::try_from(source).unwrap();

        assert_eq!(entry.id.as_uuid(), &id);
        assert_eq!(entry.outcome, AuditOutcome::Error);
        assert_eq!(entry.user_id.as_ref().map(UserId::as_str), Some("u1"));
        assert_eq!(entry.details, json!({ "handled": true }));
        assert_eq!(entry.delivery_attempt, 3);
    }

    #[test]
    fn row_with_unknown_outcome_is_rejected() {
        assert!(AuditEntry::try_from(row("pending", None, 1)).is_err());
    }

    #[test]
    fn row_with_negative_attempt_reads_as_first() {
        let entry = AuditEntry::try_from(row("success", None, -1)).unwrap();
        assert_eq!(entry.delivery_attempt, 1);
    }
}
