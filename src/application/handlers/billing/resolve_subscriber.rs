//! SubscriberResolver - maps a payment event to the internal user it concerns.

use std::sync::Arc;

use crate::domain::billing::{PaymentEvent, UserRecord, WebhookError};
use crate::domain::foundation::UserId;
use crate::ports::UserRepository;

/// A user matched to an event, with the record as it was before the event.
#[derive(Debug, Clone)]
pub struct ResolvedSubscriber {
    pub user_id: UserId,
    pub record: UserRecord,
    pub matched_by: MatchedBy,
}

/// How the user was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    /// `userId` carried in the event metadata.
    Metadata,
    /// `stripeCustomerId` stored on the record.
    CustomerId,
}

impl MatchedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedBy::Metadata => "metadata",
            MatchedBy::CustomerId => "customerId",
        }
    }
}

/// Resolves the subscriber of an event.
///
/// The metadata id wins when its record exists; otherwise the provider
/// customer id is looked up.
pub struct SubscriberResolver {
    users: Arc<dyn UserRepository>,
}

impl SubscriberResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// # Errors
    ///
    /// - `UserNotFound` - neither id matched a record
    /// - `MissingField` - the event carries neither a user id nor a customer id
    /// - `Database` - store failure
    pub async fn resolve(&self, event: &PaymentEvent) -> Result<ResolvedSubscriber, WebhookError> {
        let direct = event
            .direct_user_id()
            .and_then(|raw| UserId::new(raw).ok());

        if let Some(user_id) = &direct {
            if let Some(record) = self.users.find_by_id(user_id).await? {
                return Ok(ResolvedSubscriber {
                    user_id: user_id.clone(),
                    record,
                    matched_by: MatchedBy::Metadata,
                });
            }
            tracing::debug!(user_id = %user_id, "Metadata user id has no record, trying customer id");
        }

        let customer_id = match event.customer_id() {
            Some(id) => id,
            None if direct.is_some() => return Err(WebhookError::UserNotFound),
            None => return Err(WebhookError::MissingField("customer")),
        };

        let mut matches = self.users.find_by_stripe_customer_id(customer_id).await?;
        if matches.len() > 1 {
            tracing::warn!(
                customer_id,
                matches = matches.len(),
                "Several users share a customer id, using the first"
            );
        }
        if matches.is_empty() {
            return Err(WebhookError::UserNotFound);
        }

        let (user_id, record) = matches.swap_remove(0);
        Ok(ResolvedSubscriber {
            user_id,
            record,
            matched_by: MatchedBy::CustomerId,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryUserRepository;
    use crate::domain::billing::{InvoiceObject, SubscriptionObject};
    use serde_json::json;

    fn subscription_event(object: serde_json::Value) -> PaymentEvent {
        let sub: SubscriptionObject = serde_json::from_value(object).unwrap();
        PaymentEvent::SubscriptionUpdated(sub)
    }

    async fn repo_with(docs: &[(&str, serde_json::Value)]) -> Arc<InMemoryUserRepository> {
        let repo = Arc::new(InMemoryUserRepository::new());
        for (id, doc) in docs {
            repo.insert_document(id, doc.clone()).await;
        }
        repo
    }

    #[tokio::test]
    async fn metadata_user_id_wins() {
        let repo = repo_with(&[
            ("u1", json!({"stripeCustomerId": "cus_other"})),
            ("u2", json!({"stripeCustomerId": "cus_1"})),
        ])
        .await;
        let resolver = SubscriberResolver::new(repo);

        let event = subscription_event(json!({
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "metadata": {"userId": "u1"}
        }));
        let resolved = resolver.resolve(&event).await.unwrap();

        assert_eq!(resolved.user_id.as_str(), "u1");
        assert_eq!(resolved.matched_by, MatchedBy::Metadata);
    }

    #[tokio::test]
    async fn falls_back_to_customer_id_when_metadata_user_is_unknown() {
        let repo = repo_with(&[("u2", json!({"stripeCustomerId": "cus_1"}))]).await;
        let resolver = SubscriberResolver::new(repo);

        let event = subscription_event(json!({
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "metadata": {"userId": "deleted-user"}
        }));
        let resolved = resolver.resolve(&event).await.unwrap();

        assert_eq!(resolved.user_id.as_str(), "u2");
        assert_eq!(resolved.matched_by, MatchedBy::CustomerId);
    }

    #[tokio::test]
    async fn first_of_several_customer_matches_is_used() {
        let repo = repo_with(&[
            ("a", json!({"stripeCustomerId": "cus_dup"})),
            ("b", json!({"stripeCustomerId": "cus_dup"})),
        ])
        .await;
        let resolver = SubscriberResolver::new(repo);

        let event = subscription_event(json!({"id": "sub_1", "customer": "cus_dup", "status": "active"}));
        let resolved = resolver.resolve(&event).await.unwrap();

        assert_eq!(resolved.user_id.as_str(), "a");
    }

    #[tokio::test]
    async fn unknown_customer_is_user_not_found() {
        let resolver = SubscriberResolver::new(repo_with(&[]).await);

        let event = subscription_event(json!({"id": "sub_1", "customer": "cus_x", "status": "active"}));

        assert!(matches!(
            resolver.resolve(&event).await,
            Err(WebhookError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn event_without_any_identifier_is_missing_field() {
        let resolver = SubscriberResolver::new(repo_with(&[]).await);
        let invoice: InvoiceObject = serde_json::from_value(json!({"id": "in_1"})).unwrap();

        let result = resolver
            .resolve(&PaymentEvent::InvoicePaymentFailed(invoice))
            .await;

        assert!(matches!(result, Err(WebhookError::MissingField("customer"))));
    }
}
