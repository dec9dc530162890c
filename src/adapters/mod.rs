//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum endpoints
//! - `memory` - In-memory stores for tests and local development
//! - `postgres` - PostgreSQL stores
//! - `stripe` - Stripe REST client

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
