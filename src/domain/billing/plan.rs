//! Plan tier stored on the user record.

use serde::{Deserialize, Serialize};

/// Commercial plan of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// No paid entitlement. `premiumUntil` is always null.
    #[default]
    Free,

    /// Paid subscription.
    Premium,
}

impl Plan {
    /// Returns true for the paid plan.
    pub fn is_premium(&self) -> bool {
        matches!(self, Plan::Premium)
    }

    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
