//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `billing` - Payment events, entitlement reconciliation and rewards

pub mod billing;
pub mod foundation;
