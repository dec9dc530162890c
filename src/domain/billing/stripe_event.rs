//! Stripe webhook event envelope.
//!
//! Only fields relevant to our processing are captured. The polymorphic
//! `data.object` stays raw JSON until [`super::PaymentEvent`] decodes it.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (envelope only).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }

    /// Serialized payload, as the provider would send it.
    pub fn to_payload(self) -> String {
        serde_json::to_string(&self.build()).expect("event serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_envelope() {
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_1",
            "type": "invoice.payment_failed",
            "data": {"object": {"id": "in_1"}}
        }))
        .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "invoice.payment_failed");
        assert!(!event.is_live());
        assert!(event.api_version.is_none());
    }

    #[test]
    fn envelope_without_data_is_rejected() {
        let result: Result<StripeEvent, _> =
            serde_json::from_value(json!({"id": "evt_1", "type": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_object_reads_data_object() {
        #[derive(Deserialize)]
        struct Obj {
            id: String,
        }

        let event = StripeEventBuilder::new().object(json!({"id": "sub_9"})).build();
        let obj: Obj = event.deserialize_object().unwrap();

        assert_eq!(obj.id, "sub_9");
    }

    #[test]
    fn builder_sets_fields() {
        let event = StripeEventBuilder::new()
            .id("evt_custom")
            .event_type("customer.subscription.deleted")
            .livemode(true)
            .build();

        assert_eq!(event.id, "evt_custom");
        assert_eq!(event.event_type, "customer.subscription.deleted");
        assert!(event.is_live());
    }
}
