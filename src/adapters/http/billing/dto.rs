//! HTTP DTOs for the billing and webhook endpoints.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::HandlePaymentWebhookResult;
use crate::domain::billing::AuditOutcome;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/billing/checkout`.
///
/// Fields are optional here so that a missing field is reported as a
/// validation error naming it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub price_id: Option<String>,
}

/// Body of `POST /api/billing/portal`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Redirect target for checkout and portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    pub event_id: String,
    pub outcome: AuditOutcome,
}

impl From<HandlePaymentWebhookResult> for WebhookAck {
    fn from(result: HandlePaymentWebhookResult) -> Self {
        Self {
            received: true,
            event_id: result.event_id,
            outcome: result.outcome,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_request_tolerates_missing_fields() {
        let request: CheckoutRequest = serde_json::from_value(json!({"userId": "u1"})).unwrap();

        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert!(request.price_id.is_none());
    }

    #[test]
    fn webhook_ack_serializes_camel_case() {
        let ack = WebhookAck {
            received: true,
            event_id: "evt_1".into(),
            outcome: AuditOutcome::Error,
        };

        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"received": true, "eventId": "evt_1", "outcome": "error"})
        );
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = serde_json::to_value(ErrorResponse::new("VALIDATION_FAILED", "bad")).unwrap();

        assert_eq!(body, json!({"errorCode": "VALIDATION_FAILED", "message": "bad"}));
    }
}
