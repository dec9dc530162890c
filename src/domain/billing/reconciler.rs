//! Entitlement reconciliation.
//!
//! Pure mapping from a verified event (plus the provider subscription when
//! the event only references one) to the merge-patch for the user record.
//!
//! | Event | Patch |
//! |---|---|
//! | checkout completed, subscription mode | premium, active or incomplete, period end |
//! | subscription updated | status from provider, premium iff active |
//! | subscription deleted | free, canceled, no expiry |
//! | invoice paid | period end and plan/status from the fetched subscription |
//! | invoice failed | past_due only |
//! | anything else | nothing |

use super::payment_event::{CheckoutSessionObject, PaymentEvent, SubscriptionSnapshot};
use super::{Plan, SubscriptionStatus, UserPatch, UserRecord};
use crate::domain::foundation::Timestamp;

/// Entitlement length assumed when the provider reports no period end.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Result of reconciling one event against one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub patch: UserPatch,

    /// The record goes from the free plan to active premium with this patch.
    pub activates_premium: bool,
}

impl Reconciliation {
    fn new(current: &UserRecord, patch: UserPatch) -> Self {
        let activates_premium = !current.plan.is_premium()
            && patch.plan == Some(Plan::Premium)
            && patch.subscription_status == Some(SubscriptionStatus::Active);
        Self {
            patch,
            activates_premium,
        }
    }

    fn unchanged() -> Self {
        Self {
            patch: UserPatch::default(),
            activates_premium: false,
        }
    }
}

/// Computes the patch an event implies for `current`.
///
/// `fetched` is the provider subscription for events whose
/// [`PaymentEvent::subscription_to_fetch`] is set; it is ignored otherwise.
pub fn reconcile(
    event: &PaymentEvent,
    current: &UserRecord,
    fetched: Option<&SubscriptionSnapshot>,
    now: Timestamp,
) -> Reconciliation {
    let patch = match event {
        PaymentEvent::CheckoutCompleted(session) if session.is_subscription_mode() => {
            checkout_completed(session, fetched, now)
        }
        PaymentEvent::CheckoutCompleted(_) => return Reconciliation::unchanged(),

        PaymentEvent::SubscriptionUpdated(subscription) => {
            let snapshot = subscription.snapshot();
            UserPatch {
                stripe_subscription_id: Some(snapshot.id.clone()),
                ..entitlement_from(&snapshot, now)
            }
        }

        PaymentEvent::SubscriptionDeleted(_) => UserPatch {
            plan: Some(Plan::Free),
            subscription_status: Some(SubscriptionStatus::Canceled),
            premium_until: Some(None),
            ..Default::default()
        },

        PaymentEvent::InvoicePaymentSucceeded(_) => match fetched {
            Some(snapshot) => entitlement_from(snapshot, now),
            None => return Reconciliation::unchanged(),
        },

        PaymentEvent::InvoicePaymentFailed(_) => UserPatch {
            subscription_status: Some(SubscriptionStatus::PastDue),
            ..Default::default()
        },

        PaymentEvent::Other { .. } => return Reconciliation::unchanged(),
    };

    Reconciliation::new(current, patch)
}

fn checkout_completed(
    session: &CheckoutSessionObject,
    fetched: Option<&SubscriptionSnapshot>,
    now: Timestamp,
) -> UserPatch {
    let active = match fetched {
        Some(snapshot) => snapshot.status == SubscriptionStatus::Active,
        None => session.is_paid(),
    };
    let status = if active {
        SubscriptionStatus::Active
    } else {
        SubscriptionStatus::Incomplete
    };
    let premium_until = fetched
        .and_then(|s| s.current_period_end)
        .unwrap_or_else(|| now.add_days(DEFAULT_PERIOD_DAYS));

    UserPatch {
        plan: Some(Plan::Premium),
        subscription_status: Some(status),
        premium_until: Some(Some(premium_until)),
        stripe_customer_id: session
            .customer
            .clone()
            .or_else(|| fetched.and_then(|s| s.customer_id.clone())),
        stripe_subscription_id: session
            .subscription
            .clone()
            .or_else(|| fetched.map(|s| s.id.clone())),
        ..Default::default()
    }
}

/// Plan, status and expiry implied by a provider subscription.
fn entitlement_from(snapshot: &SubscriptionSnapshot, now: Timestamp) -> UserPatch {
    if snapshot.status.grants_premium() {
        UserPatch {
            plan: Some(Plan::Premium),
            subscription_status: Some(snapshot.status),
            premium_until: Some(Some(
                snapshot
                    .current_period_end
                    .unwrap_or_else(|| now.add_days(DEFAULT_PERIOD_DAYS)),
            )),
            ..Default::default()
        }
    } else {
        UserPatch {
            plan: Some(Plan::Free),
            subscription_status: Some(snapshot.status),
            premium_until: Some(None),
            ..Default::default()
        }
    }
}
