//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `UserRepository` - Merge-write document store for user records
//! - `AuditLog` - Append-only payment event log
//! - `PaymentProvider` - Customers, subscriptions, checkout and portal sessions

mod audit_log;
mod payment_provider;
mod user_repository;

pub use audit_log::AuditLog;
pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, PortalSession,
};
pub use user_repository::UserRepository;
