//! Billing HTTP adapter.
//!
//! Exposes the payment webhook and the checkout and portal endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CheckoutRequest, ErrorResponse, PortalRequest, UrlResponse, WebhookAck};
pub use handlers::{BillingAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{billing_router, billing_routes, webhook_routes};
