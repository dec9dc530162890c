//! Reward for a user's first move from free to active premium.

use super::{UserPatch, UserRecord};

/// Points granted on every free to active-premium transition.
pub const PREMIUM_BONUS_POINTS: u64 = 50;

/// Badge granted once, on the first transition.
pub const FIRST_PREMIUM_BADGE: &str = "premium_primeira_vez";

const POINTS_PER_LEVEL: u64 = 100;

/// Level for a score: one level per 100 points, starting at 1.
pub fn level_for_points(points: u64) -> u32 {
    u32::try_from(points / POINTS_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Patch that awards the activation bonus to `record`.
///
/// The badge is only appended when absent, so applying this twice never
/// duplicates it.
pub fn activation_reward(record: &UserRecord) -> UserPatch {
    let points = record.points.saturating_add(PREMIUM_BONUS_POINTS);

    let badges = if record.has_badge(FIRST_PREMIUM_BADGE) {
        None
    } else {
        let mut badges = record.badges.clone();
        badges.push(FIRST_PREMIUM_BADGE.to_string());
        Some(badges)
    };

    UserPatch {
        points: Some(points),
        level: Some(level_for_points(points)),
        badges,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_starts_at_one() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(250), 3);
    }

    #[test]
    fn level_saturates() {
        assert_eq!(level_for_points(u64::MAX), u32::MAX);
    }

    #[test]
    fn first_reward_adds_points_and_badge() {
        let record = UserRecord {
            points: 70,
            badges: vec!["primeiro_simulado".into()],
            ..Default::default()
        };

        let patch = activation_reward(&record);

        assert_eq!(patch.points, Some(120));
        assert_eq!(patch.level, Some(2));
        assert_eq!(
            patch.badges,
            Some(vec!["primeiro_simulado".to_string(), FIRST_PREMIUM_BADGE.to_string()])
        );
        assert_eq!(patch.plan, None);
    }

    #[test]
    fn repeat_reward_keeps_single_badge() {
        let record = UserRecord {
            points: 50,
            badges: vec![FIRST_PREMIUM_BADGE.into()],
            ..Default::default()
        };

        let after = record.patched(&activation_reward(&record));

        assert_eq!(after.points, 100);
        assert_eq!(
            after.badges.iter().filter(|b| *b == FIRST_PREMIUM_BADGE).count(),
            1
        );
    }
}
