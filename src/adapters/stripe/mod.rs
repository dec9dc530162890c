//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe:
//! - Customer creation
//! - Subscription lookup
//! - Checkout and billing-portal sessions
//!
//! Webhook verification lives in `domain::billing::StripeWebhookVerifier`.

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use api_types::{error_from_response, StripeCheckoutSession, StripeCustomer, StripePortalSession};
pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
