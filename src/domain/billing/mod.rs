//! Billing domain module.
//!
//! Keeps the user's entitlement in step with the payment provider.
//!
//! # Module Structure
//!
//! - `stripe_event` / `payment_event` - Event envelope and typed union
//! - `webhook_verifier` - Signature and replay checks
//! - `user_record` - Stored record and merge-patches
//! - `reconciler` - Event to patch mapping
//! - `rewards` - Bonus for the first premium activation
//! - `audit` - Append-only event log entries

mod audit;
mod errors;
mod payment_event;
mod plan;
mod reconciler;
mod rewards;
mod stripe_event;
mod subscription_status;
mod user_record;
mod webhook_errors;
mod webhook_verifier;

pub use audit::{AuditEntry, AuditOutcome};
pub use errors::BillingError;
pub use payment_event::{
    CheckoutSessionObject, InvoiceObject, PaymentEvent, SubscriptionObject, SubscriptionSnapshot,
    USER_ID_METADATA_KEY,
};
pub use plan::Plan;
pub use reconciler::{reconcile, Reconciliation, DEFAULT_PERIOD_DAYS};
pub use rewards::{activation_reward, level_for_points, FIRST_PREMIUM_BADGE, PREMIUM_BONUS_POINTS};
pub use stripe_event::{StripeEvent, StripeEventData};
pub use subscription_status::SubscriptionStatus;
pub use user_record::{merge_document, UserPatch, UserRecord};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS};
