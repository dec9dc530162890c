//! Billing handlers.
//!
//! ## Webhook pipeline
//! - Verifying and decoding provider events
//! - Resolving the subscriber
//! - Reconciling the entitlement and granting the activation reward
//! - Auditing every verified event
//!
//! ## Commands
//! - Starting a subscription checkout
//! - Opening the billing portal

mod audit_recorder;
mod billing_urls;
mod create_checkout_session;
mod create_portal_session;
mod grant_activation_reward;
mod handle_payment_webhook;
mod resolve_subscriber;

pub use audit_recorder::AuditRecorder;
pub use billing_urls::BillingUrls;
pub use create_checkout_session::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
};
pub use create_portal_session::{
    CreatePortalSessionCommand, CreatePortalSessionHandler, CreatePortalSessionResult,
};
pub use grant_activation_reward::{RewardGranted, RewardTrigger};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};
pub use resolve_subscriber::{MatchedBy, ResolvedSubscriber, SubscriberResolver};
