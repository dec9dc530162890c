//! User entitlement record and the merge-patches applied to it.
//!
//! The record is stored as a JSON document. Field names are the ones the
//! frontend reads (`plan`, `subscriptionStatus`, `premiumUntil`, `pontos`,
//! `nivel`, `medalhas`), so the serde names are part of the contract.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Plan, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

/// Entitlement and gamification state of one user.
///
/// Documents may carry other keys owned by the rest of the application;
/// those are ignored on read and never touched on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub plan: Plan,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subscription_status: SubscriptionStatus,

    #[serde(default)]
    pub premium_until: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,

    /// Score.
    #[serde(default, rename = "pontos", deserialize_with = "null_as_default")]
    pub points: u64,

    /// Level, derived from `points`.
    #[serde(
        default = "default_level",
        rename = "nivel",
        deserialize_with = "null_as_default_level"
    )]
    pub level: u32,

    /// Badge ids. Treated as a set.
    #[serde(default, rename = "medalhas", deserialize_with = "null_as_default")]
    pub badges: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_level() -> u32 {
    1
}

/// Reads an explicit `null` the same way as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_level<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_level))
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            plan: Plan::Free,
            subscription_status: SubscriptionStatus::Unknown,
            premium_until: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            points: 0,
            level: default_level(),
            badges: Vec::new(),
            email: None,
        }
    }
}

impl UserRecord {
    /// Returns true if the badge is already held.
    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }

    /// Returns a copy of this record with the patch applied.
    pub fn patched(&self, patch: &UserPatch) -> UserRecord {
        let mut next = self.clone();
        if let Some(plan) = patch.plan {
            next.plan = plan;
        }
        if let Some(status) = patch.subscription_status {
            next.subscription_status = status;
        }
        if let Some(until) = patch.premium_until {
            next.premium_until = until;
        }
        if let Some(customer) = &patch.stripe_customer_id {
            next.stripe_customer_id = Some(customer.clone());
        }
        if let Some(subscription) = &patch.stripe_subscription_id {
            next.stripe_subscription_id = Some(subscription.clone());
        }
        if let Some(points) = patch.points {
            next.points = points;
        }
        if let Some(level) = patch.level {
            next.level = level;
        }
        if let Some(badges) = &patch.badges {
            next.badges = badges.clone();
        }
        next
    }
}

/// Partial update of a [`UserRecord`].
///
/// `None` means "leave the stored field alone". `premium_until` is doubly
/// optional so that `Some(None)` writes an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<Option<Timestamp>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "pontos")]
    pub points: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "nivel")]
    pub level: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "medalhas")]
    pub badges: Option<Vec<String>>,
}

impl UserPatch {
    /// Patch that only records the provider customer id.
    pub fn customer(customer_id: impl Into<String>) -> Self {
        Self {
            stripe_customer_id: Some(customer_id.into()),
            ..Default::default()
        }
    }

    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self == &UserPatch::default()
    }

    /// Renders the patch as the JSON object merged into the stored document.
    pub fn to_document(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Names of the fields this patch writes, for audit details.
    pub fn fields(&self) -> Vec<String> {
        self.to_document().keys().cloned().collect()
    }
}

/// Shallow merge: every top-level key of `patch` replaces the key in `doc`.
///
/// Mirrors the document store's native merge-write (`doc || patch`).
pub fn merge_document(doc: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        doc.insert(key.clone(), value.clone());
    }
}
