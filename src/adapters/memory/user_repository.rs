//! In-memory implementation of `UserRepository`.
//!
//! Stores raw JSON documents so merges behave like the document store:
//! unknown keys survive and only patched keys change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::domain::billing::{merge_document, UserPatch, UserRecord};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserRepository;

/// Document-map backed user store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    docs: RwLock<HashMap<String, Map<String, Value>>>,
    writes: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document. Does not count as a write.
    pub async fn insert_document(&self, user_id: &str, doc: Value) {
        let doc = match doc {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.docs.write().await.insert(user_id.to_string(), doc);
    }

    /// Raw stored document.
    pub async fn document(&self, user_id: &str) -> Option<Value> {
        self.docs.read().await.get(user_id).cloned().map(Value::Object)
    }

    /// Number of merge or upsert writes performed.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::database("user store unavailable"));
        }
        Ok(())
    }
}

fn decode(doc: &Map<String, Value>) -> Result<UserRecord, DomainError> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| DomainError::database(format!("Malformed user document: {}", e)))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError> {
        self.check_available()?;
        let docs = self.docs.read().await;
        docs.get(user_id.as_str()).map(decode).transpose()
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<(UserId, UserRecord)>, DomainError> {
        self.check_available()?;
        let docs = self.docs.read().await;

        let mut matches = Vec::new();
        for (id, doc) in docs.iter() {
            if doc.get("stripeCustomerId").and_then(Value::as_str) == Some(customer_id) {
                matches.push((UserId::new(id.clone())?, decode(doc)?));
            }
        }
        matches.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok(matches)
    }

    async fn merge(&self, user_id: &UserId, patch: &UserPatch) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut docs = self.docs.write().await;
        match docs.get_mut(user_id.as_str()) {
            Some(doc) => {
                merge_document(doc, &patch.to_document());
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert(&self, user_id: &UserId, patch: &UserPatch) -> Result<(), DomainError> {
        self.check_available()?;
        let mut docs = self.docs.write().await;
        let doc = docs.entry(user_id.as_str().to_string()).or_default();
        merge_document(doc, &patch.to_document());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{Plan, SubscriptionStatus};
    use serde_json::json;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[tokio::test]
    async fn merge_preserves_unpatched_keys() {
        let repo = InMemoryUserRepository::new();
        repo.insert_document("u1", json!({"plan": "free", "displayName": "Ana", "pontos": 10}))
            .await;

        let patch = UserPatch {
            plan: Some(Plan::Premium),
            subscription_status: Some(SubscriptionStatus::Active),
            ..Default::default()
        };
        assert!(repo.merge(&uid("u1"), &patch).await.unwrap());

        let doc = repo.document("u1").await.unwrap();
        assert_eq!(doc["plan"], json!("premium"));
        assert_eq!(doc["displayName"], json!("Ana"));
        assert_eq!(doc["pontos"], json!(10));
        assert_eq!(repo.write_count(), 1);
    }

    #[tokio::test]
    async fn merge_on_missing_record_does_not_write() {
        let repo = InMemoryUserRepository::new();

        let merged = repo.merge(&uid("ghost"), &UserPatch::customer("cus_1")).await.unwrap();

        assert!(!merged);
        assert_eq!(repo.write_count(), 0);
        assert!(repo.document("ghost").await.is_none());
    }

    #[tokio::test]
    async fn explicit_null_clears_premium_until() {
        let repo = InMemoryUserRepository::new();
        repo.insert_document("u1", json!({"premiumUntil": "2030-01-01T00:00:00Z"})).await;

        let patch = UserPatch {
            premium_until: Some(None),
            ..Default::default()
        };
        repo.merge(&uid("u1"), &patch).await.unwrap();

        let doc = repo.document("u1").await.unwrap();
        assert_eq!(doc["premiumUntil"], Value::Null);
        assert_eq!(repo.find_by_id(&uid("u1")).await.unwrap().unwrap().premium_until, None);
    }

    #[tokio::test]
    async fn finds_users_by_customer_id() {
        let repo = InMemoryUserRepository::new();
        repo.insert_document("u1", json!({"stripeCustomerId": "cus_1"})).await;
        repo.insert_document("u2", json!({"stripeCustomerId": "cus_2"})).await;

        let found = repo.find_by_stripe_customer_id("cus_2").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.as_str(), "u2");
    }

    #[tokio::test]
    async fn upsert_creates_missing_record() {
        let repo = InMemoryUserRepository::new();

        repo.upsert(&uid("u1"), &UserPatch::customer("cus_9")).await.unwrap();

        let record = repo.find_by_id(&uid("u1")).await.unwrap().unwrap();
        assert_eq!(record.stripe_customer_id.as_deref(), Some("cus_9"));
        assert_eq!(record.plan, Plan::Free);
    }

    #[tokio::test]
    async fn unavailable_store_returns_database_error() {
        let repo = InMemoryUserRepository::new();
        repo.set_unavailable(true);

        let err = repo.find_by_id(&uid("u1")).await.unwrap_err();

        assert_eq!(err.code, crate::domain::foundation::ErrorCode::DatabaseError);
    }
}
