//! Shared wiring for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use exam_prep_billing::adapters::http::billing::{BillingAppState, STRIPE_SIGNATURE_HEADER};
use exam_prep_billing::adapters::http::billing_router;
use exam_prep_billing::adapters::memory::{InMemoryAuditLog, InMemoryUserRepository};
use exam_prep_billing::adapters::stripe::MockPaymentProvider;
use exam_prep_billing::application::handlers::billing::BillingUrls;
use exam_prep_billing::domain::billing::{sign_payload, StripeWebhookVerifier};

pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub audit: Arc<InMemoryAuditLog>,
    pub provider: MockPaymentProvider,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let provider = MockPaymentProvider::new();

        let state = BillingAppState {
            user_repository: users.clone(),
            audit_log: audit.clone(),
            payment_provider: Arc::new(provider.clone()),
            webhook_verifier: StripeWebhookVerifier::new(WEBHOOK_SECRET),
            urls: BillingUrls::from_base("https://app.example.com"),
        };

        Self {
            router: billing_router(state),
            users,
            audit,
            provider,
        }
    }

    /// Sends a request and returns the status and the JSON body (or the
    /// raw text as a JSON string).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// Posts an event signed with the test secret.
    pub async fn deliver(&self, event: &Value) -> (StatusCode, Value) {
        let payload = event.to_string();
        let signature =
            sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();
        self.send(webhook_request(payload, Some(&signature))).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

pub fn webhook_request(payload: String, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/webhooks/stripe").header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(STRIPE_SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

pub fn event(id: &str, event_type: &str, object: Value) -> Value {
    serde_json::json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": object }
    })
}
