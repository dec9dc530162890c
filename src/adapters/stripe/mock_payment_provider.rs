//! Mock payment provider for testing and local development.
//!
//! Provides a configurable implementation of `PaymentProvider`. Supports:
//! - Pre-configured subscriptions
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::SubscriptionSnapshot;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentProvider, PortalSession,
};

/// Mock payment provider.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_subscription(SubscriptionSnapshot { .. });
/// mock.fail_on("get_subscription", PaymentError::network("timeout"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Subscriptions known to the "provider", by id.
    subscriptions: HashMap<String, SubscriptionSnapshot>,

    /// Counter used to mint ids.
    sequence: u32,

    /// Errors returned by method name until cleared.
    method_errors: HashMap<String, PaymentError>,

    /// Every checkout request received.
    checkout_requests: Vec<CreateCheckoutRequest>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a subscription returned by `get_subscription`.
    pub fn add_subscription(&self, subscription: SubscriptionSnapshot) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Make a method fail with `error` until [`Self::clear_errors`].
    pub fn fail_on(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().checkout_requests.clone()
    }

    /// Records the call and returns the injected error, if any.
    fn enter(&self, method: &str, args: Vec<String>) -> Result<u32, PaymentError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }
        state.sequence += 1;
        Ok(state.sequence)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let n = self.enter("create_customer", vec![request.user_id.to_string()])?;
        Ok(Customer {
            id: format!("cus_mock_{}", n),
            email: request.email,
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        self.enter("get_subscription", vec![subscription_id.to_string()])?;
        Ok(self.state().subscriptions.get(subscription_id).cloned())
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let n = self.enter(
            "create_checkout_session",
            vec![
                request.user_id.to_string(),
                request.customer_id.clone(),
                request.price_id.clone(),
            ],
        )?;
        self.state().checkout_requests.push(request);

        let id = format!("cs_mock_{}", n);
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/c/pay/{}", id),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let n = self.enter(
            "create_portal_session",
            vec![customer_id.to_string(), return_url.to_string()],
        )?;

        let id = format!("bps_mock_{}", n);
        Ok(PortalSession {
            url: format!("https://billing.stripe.test/p/session/{}", id),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn returns_configured_subscription() {
        let mock = MockPaymentProvider::new();
        mock.add_subscription(SubscriptionSnapshot {
            id: "sub_1".into(),
            customer_id: Some("cus_1".into()),
            status: SubscriptionStatus::Active,
            current_period_end: None,
        });

        let found = mock.get_subscription("sub_1").await.unwrap();
        let missing = mock.get_subscription("sub_2").await.unwrap();

        assert_eq!(found.map(|s| s.status), Some(SubscriptionStatus::Active));
        assert!(missing.is_none());
        assert_eq!(mock.call_count("get_subscription"), 2);
    }

    #[tokio::test]
    async fn injected_error_is_returned_until_cleared() {
        let mock = MockPaymentProvider::new();
        mock.fail_on("create_portal_session", PaymentError::network("down"));

        assert!(mock.create_portal_session("cus_1", "https://x").await.is_err());

        mock.clear_errors();
        let session = mock.create_portal_session("cus_1", "https://x").await.unwrap();
        assert!(session.url.contains(&session.id));
    }

    #[tokio::test]
    async fn mints_distinct_customer_ids() {
        let mock = MockPaymentProvider::new();
        let request = || CreateCustomerRequest {
            user_id: UserId::new("u1").unwrap(),
            email: None,
            idempotency_key: None,
        };

        let a = mock.create_customer(request()).await.unwrap();
        let b = mock.create_customer(request()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(mock.calls()[0].args, vec!["u1".to_string()]);
    }
}
