//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait over the Stripe REST API
//! (form-encoded requests, basic auth with the secret key).
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::billing::{SubscriptionObject, SubscriptionSnapshot, USER_ID_METADATA_KEY};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, PortalSession,
};

use super::api_types::{
    error_from_response, StripeCheckoutSession, StripeCustomer, StripePortalSession,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL (for stripe-mock or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Sends a request and decodes the JSON body, mapping Stripe errors.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<T, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "Stripe request failed");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status.as_u16(), &body);
            tracing::warn!(
                operation,
                status = status.as_u16(),
                payment_code = %err.code,
                provider_code = ?err.provider_code,
                "Stripe API returned an error"
            );
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Form parameters for `POST /v1/customers`.
fn customer_params(request: &CreateCustomerRequest) -> Vec<(String, String)> {
    let mut params = vec![(
        format!("metadata[{}]", USER_ID_METADATA_KEY),
        request.user_id.to_string(),
    )];
    if let Some(email) = &request.email {
        params.push(("email".to_string(), email.clone()));
    }
    params
}

/// Form parameters for `POST /v1/checkout/sessions`.
///
/// The user id is attached to the session and to the subscription it
/// creates, so every later event can be resolved without a customer lookup.
fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let user_id = request.user_id.to_string();
    vec![
        ("mode".to_string(), "subscription".to_string()),
        ("customer".to_string(), request.customer_id.clone()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("client_reference_id".to_string(), user_id.clone()),
        (format!("metadata[{}]", USER_ID_METADATA_KEY), user_id.clone()),
        (
            format!("subscription_data[metadata][{}]", USER_ID_METADATA_KEY),
            user_id,
        ),
    ]
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let mut builder = self
            .http_client
            .post(self.url("/v1/customers"))
            .form(&customer_params(&request));
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let customer: StripeCustomer = self.send(builder, "create_customer").await?;

        tracing::info!(user_id = %request.user_id, customer_id = %customer.id, "Stripe customer created");

        Ok(Customer {
            id: customer.id,
            email: customer.email.or(request.email),
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        let builder = self
            .http_client
            .get(self.url(&format!("/v1/subscriptions/{}", subscription_id)));

        match self.send::<SubscriptionObject>(builder, "get_subscription").await {
            Ok(subscription) => Ok(Some(subscription.snapshot())),
            Err(err) if err.code == PaymentErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let builder = self
            .http_client
            .post(self.url("/v1/checkout/sessions"))
            .form(&checkout_params(&request));

        let session: StripeCheckoutSession = self.send(builder, "create_checkout_session").await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::provider("Checkout session has no URL"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let builder = self
            .http_client
            .post(self.url("/v1/billing_portal/sessions"))
            .form(&[("customer", customer_id), ("return_url", return_url)]);

        let portal: StripePortalSession = self.send(builder, "create_portal_session").await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }
}
