//! HTTP handlers for the billing and webhook endpoints.
//!
//! These handlers connect Axum routes to the billing command handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::handlers::billing::{
    BillingUrls, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    CreatePortalSessionCommand, CreatePortalSessionHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler,
};
use crate::domain::billing::{BillingError, StripeWebhookVerifier, WebhookError};
use crate::domain::foundation::UserId;
use crate::ports::{AuditLog, PaymentProvider, UserRepository};

use super::dto::{CheckoutRequest, ErrorResponse, PortalRequest, UrlResponse, WebhookAck};

/// Header carrying the provider signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Built once in `main` and cloned per request.
#[derive(Clone)]
pub struct BillingAppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub audit_log: Arc<dyn AuditLog>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: StripeWebhookVerifier,
    pub urls: BillingUrls,
}

impl BillingAppState {
    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.user_repository.clone(),
            self.audit_log.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.user_repository.clone(),
            self.payment_provider.clone(),
            self.urls.clone(),
        )
    }

    pub fn portal_handler(&self) -> CreatePortalSessionHandler {
        CreatePortalSessionHandler::new(
            self.user_repository.clone(),
            self.payment_provider.clone(),
            self.urls.portal_return_url.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle Stripe webhook events
///
/// The body is taken as raw bytes: the signature covers the exact payload.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook_handler().handle(cmd).await?;

    Ok(Json(WebhookAck::from(result)))
}

/// POST /api/billing/checkout - Start a subscription checkout
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    request: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = request.map_err(rejected_body)?;

    let cmd = CreateCheckoutSessionCommand {
        user_id: required_user_id(request.user_id)?,
        price_id: request
            .price_id
            .ok_or_else(|| BillingError::validation("priceId", "Field is required"))?,
    };

    let result = state.checkout_handler().handle(cmd).await?;

    Ok(Json(UrlResponse { url: result.url }))
}

/// POST /api/billing/portal - Open the billing portal
pub async fn create_portal(
    State(state): State<BillingAppState>,
    request: Result<Json<PortalRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = request.map_err(rejected_body)?;

    let cmd = CreatePortalSessionCommand {
        user_id: required_user_id(request.user_id)?,
    };

    let result = state.portal_handler().handle(cmd).await?;

    Ok(Json(UrlResponse { url: result.url }))
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

fn required_user_id(raw: Option<String>) -> Result<UserId, BillingError> {
    let raw = raw.ok_or_else(|| BillingError::validation("userId", "Field is required"))?;
    Ok(UserId::new(raw)?)
}

fn rejected_body(rejection: JsonRejection) -> BillingApiError {
    BillingApiError(BillingError::validation("body", rejection.body_text()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error for the webhook endpoint.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        if self.0.is_retryable() {
            tracing::error!(error = %self.0, "Payment webhook failed; provider will retry");
        }
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}

/// API error for the checkout and portal endpoints.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl BillingApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            BillingError::UserNotFound(_) | BillingError::NoBillingAccount(_) => {
                StatusCode::NOT_FOUND
            }
            BillingError::PaymentProvider(_) | BillingError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Billing request failed");
        }

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        if let BillingError::ValidationFailed { field, .. } = &self.0 {
            body = body.with_details(json!({ "field": field }));
        }
        (status, Json(body)).into_response()
    }
}
