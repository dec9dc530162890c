//! Exam Prep Billing - payment webhook reconciliation service
//!
//! Receives subscription lifecycle events from the payment provider and
//! keeps each user's plan, subscription status, premium expiry and
//! gamification rewards in step with them. Also exposes the checkout and
//! billing-portal entry points that start those lifecycles.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
