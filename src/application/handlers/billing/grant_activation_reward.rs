//! RewardTrigger - awards the bonus for a free to active-premium transition.

use std::sync::Arc;

use crate::domain::billing::{activation_reward, UserPatch};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::UserRepository;

/// What the reward wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardGranted {
    pub points: u64,
    pub level: u32,
    /// False when the badge was already held.
    pub badge_added: bool,
}

/// Applies [`activation_reward`] to the stored record.
///
/// Reads the record again after the entitlement write so the bonus is
/// added to the latest score.
pub struct RewardTrigger {
    users: Arc<dyn UserRepository>,
}

impl RewardTrigger {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// # Errors
    ///
    /// - `UserNotFound` - the record disappeared since the entitlement write
    /// - `DatabaseError` - store failure
    pub async fn grant(&self, user_id: &UserId) -> Result<RewardGranted, DomainError> {
        let record = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User record vanished"))?;

        let patch: UserPatch = activation_reward(&record);
        let granted = RewardGranted {
            points: patch.points.unwrap_or(record.points),
            level: patch.level.unwrap_or(record.level),
            badge_added: patch.badges.is_some(),
        };

        if !self.users.merge(user_id, &patch).await? {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User record vanished"));
        }

        tracing::info!(
            user_id = %user_id,
            points = granted.points,
            level = granted.level,
            badge_added = granted.badge_added,
            "Premium activation reward granted"
        );

        Ok(granted)
    }
}
