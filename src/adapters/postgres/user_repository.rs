//! PostgreSQL implementation of UserRepository.
//!
//! Records live in `users.doc` (JSONB). Writes use the `||` operator so
//! only the patched top-level keys change.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::billing::{UserPatch, UserRecord};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserRepository;

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    doc: Json<Value>,
}

fn decode(doc: Value) -> Result<UserRecord, DomainError> {
    serde_json::from_value(doc)
        .map_err(|e| DomainError::database(format!("Malformed user document: {}", e)))
}

fn patch_json(patch: &UserPatch) -> Json<Value> {
    Json(Value::Object(patch.to_document()))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT id, doc FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(|r| decode(r.doc.0)).transpose()
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<(UserId, UserRecord)>, DomainError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, doc FROM users
            WHERE doc->>'stripeCustomerId' = $1
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find user by customer: {}", e)))?;

        rows.into_iter()
            .map(|r| Ok((UserId::new(r.id)?, decode(r.doc.0)?)))
            .collect()
    }

    async fn merge(&self, user_id: &UserId, patch: &UserPatch) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                doc = doc || $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(patch_json(patch))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, user_id: &UserId, patch: &UserPatch) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, doc) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET
                doc = users.doc || EXCLUDED.doc,
                updated_at = now()
            "#,
        )
        .bind(user_id.as_str())
        .bind(patch_json(patch))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert user: {}", e)))?;

        Ok(())
    }
}
