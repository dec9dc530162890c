//! User record store port.
//!
//! The `users` collection is a document store keyed by internal user id.
//! All writes are merge-patches: keys absent from the patch are preserved,
//! concurrent merges are last-write-wins per field.

use crate::domain::billing::{UserPatch, UserRecord};
use crate::domain::foundation::{DomainError, UserId};
use async_trait::async_trait;

/// Repository port for user entitlement records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a record by internal user id.
    ///
    /// Returns `None` if no record exists.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError>;

    /// Find the users whose `stripeCustomerId` equals `customer_id`.
    ///
    /// At most one match is expected; callers decide what to do with more.
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<(UserId, UserRecord)>, DomainError>;

    /// Merge the patch into an existing record.
    ///
    /// Returns `false` without writing when the record does not exist.
    async fn merge(&self, user_id: &UserId, patch: &UserPatch) -> Result<bool, DomainError>;

    /// Merge the patch, creating the record when absent.
    async fn upsert(&self, user_id: &UserId, patch: &UserPatch) -> Result<(), DomainError>;
}
