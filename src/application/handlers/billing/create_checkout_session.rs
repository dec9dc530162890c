//! CreateCheckoutSessionHandler - starts a hosted subscription checkout.

use std::sync::Arc;

use super::billing_urls::BillingUrls;
use crate::domain::billing::{BillingError, UserPatch};
use crate::domain::foundation::UserId;
use crate::ports::{CreateCheckoutRequest, CreateCustomerRequest, PaymentProvider, UserRepository};

/// Command to start checkout for a plan price.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub user_id: UserId,
    pub price_id: String,
}

#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionResult {
    pub session_id: String,
    /// Hosted checkout page the client is sent to.
    pub url: String,
    pub customer_id: String,
    /// True if a provider customer was created for this request.
    pub customer_created: bool,
}

/// Handler for starting checkout.
///
/// Reuses the stored provider customer or creates one and records it on the
/// user, so that later events resolve by customer id as well.
pub struct CreateCheckoutSessionHandler {
    users: Arc<dyn UserRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    urls: BillingUrls,
}

impl CreateCheckoutSessionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        urls: BillingUrls,
    ) -> Self {
        Self {
            users,
            payment_provider,
            urls,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, BillingError> {
        let price_id = cmd.price_id.trim();
        if price_id.is_empty() {
            return Err(BillingError::validation("priceId", "Price id is required"));
        }

        // 1. Reuse or create the provider customer
        let record = self.users.find_by_id(&cmd.user_id).await?;
        let existing = record.as_ref().and_then(|r| r.stripe_customer_id.clone());

        let (customer_id, customer_created) = match existing {
            Some(id) => (id, false),
            None => {
                let customer = self
                    .payment_provider
                    .create_customer(CreateCustomerRequest {
                        user_id: cmd.user_id.clone(),
                        email: record.as_ref().and_then(|r| r.email.clone()),
                        idempotency_key: Some(format!("customer-{}", cmd.user_id)),
                    })
                    .await
                    .map_err(|e| BillingError::payment_provider(e.message))?;

                self.users
                    .upsert(&cmd.user_id, &UserPatch::customer(customer.id.clone()))
                    .await?;
                (customer.id, true)
            }
        };

        // 2. Create the hosted session
        let session = self
            .payment_provider
            .create_checkout_session(CreateCheckoutRequest {
                user_id: cmd.user_id.clone(),
                customer_id: customer_id.clone(),
                price_id: price_id.to_string(),
                success_url: self.urls.success_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await
            .map_err(|e| BillingError::payment_provider(e.message))?;

        tracing::info!(
            user_id = %cmd.user_id,
            customer_id = %customer_id,
            session_id = %session.id,
            customer_created,
            "Checkout session created"
        );

        Ok(CreateCheckoutSessionResult {
            session_id: session.id,
            url: session.url,
            customer_id,
            customer_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryUserRepository;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::ports::PaymentError;
    use serde_json::json;

    fn setup() -> (CreateCheckoutSessionHandler, Arc<InMemoryUserRepository>, MockPaymentProvider) {
        let users = Arc::new(InMemoryUserRepository::new());
        let provider = MockPaymentProvider::new();
        let handler = CreateCheckoutSessionHandler::new(
            users.clone(),
            Arc::new(provider.clone()),
            BillingUrls::from_base("https://app.example.com"),
        );
        (handler, users, provider)
    }

    fn command(price_id: &str) -> CreateCheckoutSessionCommand {
        CreateCheckoutSessionCommand {
            user_id: UserId::new("u1").unwrap(),
            price_id: price_id.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_and_stores_customer_for_new_user() {
        let (handler, users, provider) = setup();
        users.insert_document("u1", json!({"plan": "free", "email": "ana@example.com"})).await;

        let result = handler.handle(command("price_monthly")).await.unwrap();

        assert!(result.customer_created);
        assert_eq!(provider.call_count("create_customer"), 1);
        let doc = users.document("u1").await.unwrap();
        assert_eq!(doc["stripeCustomerId"], json!(result.customer_id));
        assert_eq!(doc["email"], json!("ana@example.com"));

        let requests = provider.checkout_requests();
        assert_eq!(requests[0].price_id, "price_monthly");
        assert_eq!(requests[0].cancel_url, "https://app.example.com/premium?checkout=canceled");
    }

    #[tokio::test]
    async fn reuses_existing_customer() {
        let (handler, users, provider) = setup();
        users.insert_document("u1", json!({"stripeCustomerId": "cus_existing"})).await;

        let result = handler.handle(command("price_monthly")).await.unwrap();

        assert!(!result.customer_created);
        assert_eq!(result.customer_id, "cus_existing");
        assert_eq!(provider.call_count("create_customer"), 0);
        assert_eq!(users.write_count(), 0);
    }

    #[tokio::test]
    async fn blank_price_is_rejected() {
        let (handler, _users, provider) = setup();

        let err = handler.handle(command("  ")).await.unwrap_err();

        assert!(matches!(err, BillingError::ValidationFailed { ref field, .. } if field == "priceId"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_payment_error() {
        let (handler, _users, provider) = setup();
        provider.fail_on("create_checkout_session", PaymentError::invalid_request("No such price"));

        let err = handler.handle(command("price_x")).await.unwrap_err();

        assert!(matches!(err, BillingError::PaymentProvider(_)));
    }
}
