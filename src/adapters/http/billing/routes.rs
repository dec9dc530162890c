//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_checkout, create_portal, handle_stripe_webhook, health, BillingAppState};

/// Checkout and portal routes, mounted at `/api/billing`.
///
/// - `POST /checkout` - Start a subscription checkout
/// - `POST /portal` - Open the billing portal
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
}

/// Webhook routes, mounted at `/api/webhooks`.
///
/// No user authentication; every request is verified by signature.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete billing router with state applied.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(state).layer(TraceLayer::new_for_http());
/// ```
pub fn billing_router(state: BillingAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/billing", billing_routes())
        .nest("/api/webhooks", webhook_routes())
        .with_state(state)
}
