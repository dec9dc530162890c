//! Typed payment events.
//!
//! The envelope's `data.object` is decoded into the object type that
//! belongs to the event type. Anything we do not reconcile lands in
//! [`PaymentEvent::Other`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;
use super::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

/// Metadata key carrying the internal user id on provider objects.
pub const USER_ID_METADATA_KEY: &str = "userId";

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CUSTOMER_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const CUSTOMER_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// Provider fields that may arrive either as an id or as an expanded object.
fn expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expandable {
        Id(String),
        Object { id: String },
    }

    Ok(
        Option::<Expandable>::deserialize(deserializer)?.map(|value| match value {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }),
    )
}

fn metadata_user_id(metadata: &HashMap<String, String>) -> Option<&str> {
    metadata
        .get(USER_ID_METADATA_KEY)
        .map(String::as_str)
        .filter(|id| !id.trim().is_empty())
}

/// `checkout.session` object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,

    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,

    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,

    /// `payment`, `setup` or `subscription`.
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub client_reference_id: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn is_subscription_mode(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// `subscription` object, as sent in events and returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,

    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,

    pub status: String,

    /// Period end on older API versions.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Newer API versions carry the period on each item.
    #[serde(default)]
    pub items: Option<SubscriptionItems>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionObject {
    /// Current billing period end, from the top level or the latest item.
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end.or_else(|| {
            self.items
                .as_ref()?
                .data
                .iter()
                .filter_map(|item| item.current_period_end)
                .max()
        })
    }

    /// Normalizes the provider object.
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            id: self.id.clone(),
            customer_id: self.customer.clone(),
            status: SubscriptionStatus::from_provider(&self.status),
            current_period_end: self.period_end().and_then(Timestamp::from_unix_secs),
        }
    }
}

/// Provider subscription state relevant to entitlements.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
}

/// `invoice` object.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,

    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,

    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,

    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,

    /// Newer API versions nest the subscription reference here.
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceSubscriptionDetails {
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,
}

impl InvoiceObject {
    fn details(&self) -> impl Iterator<Item = &InvoiceSubscriptionDetails> {
        self.subscription_details.iter().chain(
            self.parent
                .as_ref()
                .and_then(|p| p.subscription_details.as_ref()),
        )
    }

    /// Subscription this invoice bills, if any.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_deref()
            .or_else(|| self.details().find_map(|d| d.subscription.as_deref()))
    }

    fn user_id(&self) -> Option<&str> {
        self.details().find_map(|d| metadata_user_id(&d.metadata))
    }
}

/// A verified provider event, decoded by type.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    CheckoutCompleted(CheckoutSessionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    InvoicePaymentSucceeded(InvoiceObject),
    InvoicePaymentFailed(InvoiceObject),
    Other { event_type: String },
}

impl PaymentEvent {
    /// Decodes the envelope's data object according to its type.
    ///
    /// # Errors
    ///
    /// `ParseError` if a known event type carries an object of the wrong shape.
    pub fn from_stripe(event: &StripeEvent) -> Result<Self, WebhookError> {
        let parse = |e: serde_json::Error| {
            WebhookError::ParseError(format!("{} object: {}", event.event_type, e))
        };

        let decoded = match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                PaymentEvent::CheckoutCompleted(event.deserialize_object().map_err(parse)?)
            }
            CUSTOMER_SUBSCRIPTION_UPDATED => {
                PaymentEvent::SubscriptionUpdated(event.deserialize_object().map_err(parse)?)
            }
            CUSTOMER_SUBSCRIPTION_DELETED => {
                PaymentEvent::SubscriptionDeleted(event.deserialize_object().map_err(parse)?)
            }
            INVOICE_PAYMENT_SUCCEEDED => {
                PaymentEvent::InvoicePaymentSucceeded(event.deserialize_object().map_err(parse)?)
            }
            INVOICE_PAYMENT_FAILED => {
                PaymentEvent::InvoicePaymentFailed(event.deserialize_object().map_err(parse)?)
            }
            other => PaymentEvent::Other {
                event_type: other.to_string(),
            },
        };

        Ok(decoded)
    }

    /// Provider type tag of this event.
    pub fn event_type(&self) -> &str {
        match self {
            PaymentEvent::CheckoutCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            PaymentEvent::SubscriptionUpdated(_) => CUSTOMER_SUBSCRIPTION_UPDATED,
            PaymentEvent::SubscriptionDeleted(_) => CUSTOMER_SUBSCRIPTION_DELETED,
            PaymentEvent::InvoicePaymentSucceeded(_) => INVOICE_PAYMENT_SUCCEEDED,
            PaymentEvent::InvoicePaymentFailed(_) => INVOICE_PAYMENT_FAILED,
            PaymentEvent::Other { event_type } => event_type,
        }
    }

    /// Returns true for types the reconciler acts on.
    pub fn is_handled(&self) -> bool {
        !matches!(self, PaymentEvent::Other { .. })
    }

    /// Internal user id embedded in the event metadata, if any.
    pub fn direct_user_id(&self) -> Option<&str> {
        match self {
            PaymentEvent::CheckoutCompleted(session) => metadata_user_id(&session.metadata)
                .or_else(|| {
                    session
                        .client_reference_id
                        .as_deref()
                        .filter(|id| !id.trim().is_empty())
                }),
            PaymentEvent::SubscriptionUpdated(sub) | PaymentEvent::SubscriptionDeleted(sub) => {
                metadata_user_id(&sub.metadata)
            }
            PaymentEvent::InvoicePaymentSucceeded(invoice)
            | PaymentEvent::InvoicePaymentFailed(invoice) => invoice.user_id(),
            PaymentEvent::Other { .. } => None,
        }
    }

    /// Provider customer id, used as the resolver fallback.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            PaymentEvent::CheckoutCompleted(session) => session.customer.as_deref(),
            PaymentEvent::SubscriptionUpdated(sub) | PaymentEvent::SubscriptionDeleted(sub) => {
                sub.customer.as_deref()
            }
            PaymentEvent::InvoicePaymentSucceeded(invoice)
            | PaymentEvent::InvoicePaymentFailed(invoice) => invoice.customer.as_deref(),
            PaymentEvent::Other { .. } => None,
        }
    }

    /// Subscription the reconciler needs fetched from the provider first.
    ///
    /// Subscription events carry the object themselves; checkout sessions
    /// and invoices only reference it.
    pub fn subscription_to_fetch(&self) -> Option<&str> {
        match self {
            PaymentEvent::CheckoutCompleted(session) if session.is_subscription_mode() => {
                session.subscription.as_deref()
            }
            PaymentEvent::InvoicePaymentSucceeded(invoice) => invoice.subscription_id(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::stripe_event::StripeEventBuilder;
    use serde_json::json;

    fn decode(event_type: &str, object: serde_json::Value) -> PaymentEvent {
        let event = StripeEventBuilder::new()
            .event_type(event_type)
            .object(object)
            .build();
        PaymentEvent::from_stripe(&event).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // Decoding
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn decodes_checkout_session() {
        let event = decode(
            CHECKOUT_SESSION_COMPLETED,
            json!({
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "mode": "subscription",
                "payment_status": "paid",
                "metadata": {"userId": "u1"}
            }),
        );

        match &event {
            PaymentEvent::CheckoutCompleted(session) => {
                assert!(session.is_subscription_mode());
                assert!(session.is_paid());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(event.direct_user_id(), Some("u1"));
        assert_eq!(event.customer_id(), Some("cus_1"));
        assert_eq!(event.subscription_to_fetch(), Some("sub_1"));
    }

    #[test]
    fn unknown_type_is_other() {
        let event = decode("customer.created", json!({"id": "cus_1"}));

        assert!(!event.is_handled());
        assert_eq!(event.event_type(), "customer.created");
        assert_eq!(event.direct_user_id(), None);
        assert_eq!(event.subscription_to_fetch(), None);
    }

    #[test]
    fn wrong_object_shape_is_parse_error() {
        let event = StripeEventBuilder::new()
            .event_type(CUSTOMER_SUBSCRIPTION_UPDATED)
            .object(json!({"id": "sub_1"}))
            .build();

        let result = PaymentEvent::from_stripe(&event);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn expanded_customer_object_yields_id() {
        let event = decode(
            CUSTOMER_SUBSCRIPTION_DELETED,
            json!({"id": "sub_1", "status": "canceled", "customer": {"id": "cus_9", "object": "customer"}}),
        );

        assert_eq!(event.customer_id(), Some("cus_9"));
    }

    // ══════════════════════════════════════════════════════════════
    // Resolver hints
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn checkout_falls_back_to_client_reference_id() {
        let event = decode(
            CHECKOUT_SESSION_COMPLETED,
            json!({"id": "cs_1", "mode": "subscription", "client_reference_id": "u7"}),
        );

        assert_eq!(event.direct_user_id(), Some("u7"));
    }

    #[test]
    fn blank_metadata_user_id_is_ignored() {
        let event = decode(
            CUSTOMER_SUBSCRIPTION_UPDATED,
            json!({"id": "sub_1", "status": "active", "metadata": {"userId": "  "}}),
        );

        assert_eq!(event.direct_user_id(), None);
    }

    #[test]
    fn invoice_reads_user_from_subscription_details() {
        let event = decode(
            INVOICE_PAYMENT_FAILED,
            json!({
                "id": "in_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "subscription_details": {"metadata": {"userId": "u3"}}
            }),
        );

        assert_eq!(event.direct_user_id(), Some("u3"));
        // Failed invoices never trigger a provider fetch.
        assert_eq!(event.subscription_to_fetch(), None);
    }

    #[test]
    fn invoice_reads_subscription_from_parent() {
        let event = decode(
            INVOICE_PAYMENT_SUCCEEDED,
            json!({
                "id": "in_1",
                "parent": {"subscription_details": {"subscription": "sub_42", "metadata": {"userId": "u4"}}}
            }),
        );

        assert_eq!(event.subscription_to_fetch(), Some("sub_42"));
        assert_eq!(event.direct_user_id(), Some("u4"));
    }

    #[test]
    fn payment_mode_checkout_fetches_nothing() {
        let event = decode(
            CHECKOUT_SESSION_COMPLETED,
            json!({"id": "cs_1", "mode": "payment", "subscription": null}),
        );

        assert_eq!(event.subscription_to_fetch(), None);
    }

    // ══════════════════════════════════════════════════════════════
    // Subscription snapshot
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn snapshot_prefers_top_level_period_end() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "active",
            "current_period_end": 1_900_000_000,
            "items": {"data": [{"current_period_end": 1_800_000_000}]}
        }))
        .unwrap();

        let snapshot = sub.snapshot();

        assert_eq!(snapshot.status, SubscriptionStatus::Active);
        assert_eq!(
            snapshot.current_period_end.map(|t| t.as_unix_secs()),
            Some(1_900_000_000)
        );
    }

    #[test]
    fn snapshot_falls_back_to_latest_item_period_end() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "past_due",
            "items": {"data": [
                {"current_period_end": 1_800_000_000},
                {"current_period_end": 1_850_000_000}
            ]}
        }))
        .unwrap();

        let snapshot = sub.snapshot();

        assert_eq!(snapshot.status, SubscriptionStatus::PastDue);
        assert_eq!(
            snapshot.current_period_end.map(|t| t.as_unix_secs()),
            Some(1_850_000_000)
        );
    }
}
