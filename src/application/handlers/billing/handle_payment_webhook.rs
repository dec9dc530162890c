//! HandlePaymentWebhookHandler - Command handler for payment provider webhooks.
//!
//! Verifies the event, resolves the subscriber, reconciles the entitlement,
//! grants the activation reward and writes one audit entry per invocation.

use std::sync::Arc;

use serde_json::{json, Value};

use super::audit_recorder::AuditRecorder;
use super::grant_activation_reward::{RewardGranted, RewardTrigger};
use super::resolve_subscriber::{MatchedBy, SubscriberResolver};
use crate::domain::billing::{
    reconcile, AuditEntry, AuditOutcome, PaymentEvent, StripeWebhookVerifier, WebhookError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{AuditLog, PaymentProvider, UserRepository};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if sent.
    pub signature: Option<String>,
}

/// Result of a webhook the provider should not retry.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookResult {
    pub event_id: String,
    pub event_type: String,
    /// `Error` when the subscriber could not be found.
    pub outcome: AuditOutcome,
    pub user_id: Option<UserId>,
    pub updated_fields: Vec<String>,
    pub reward: Option<RewardGranted>,
    pub delivery_attempt: u32,
}

#[derive(Debug, Default)]
struct Processed {
    user_id: Option<UserId>,
    matched_by: Option<MatchedBy>,
    updated_fields: Vec<String>,
    reward: Option<RewardGranted>,
    reward_error: Option<String>,
}

struct Failure {
    user_id: Option<UserId>,
    error: WebhookError,
}

/// Handler for processing payment provider webhooks.
pub struct HandlePaymentWebhookHandler {
    verifier: StripeWebhookVerifier,
    users: Arc<dyn UserRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    resolver: SubscriberResolver,
    reward: RewardTrigger,
    audit: AuditRecorder,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        users: Arc<dyn UserRepository>,
        audit_log: Arc<dyn AuditLog>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            verifier,
            resolver: SubscriberResolver::new(users.clone()),
            reward: RewardTrigger::new(users.clone()),
            audit: AuditRecorder::new(audit_log),
            users,
            payment_provider,
        }
    }

    /// Processes one delivery.
    ///
    /// # Errors
    ///
    /// Signature and payload errors are returned before anything is read or
    /// written. Every error after verification is audited first.
    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Verify signature and parse the envelope
        let signature = cmd
            .signature
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let envelope = self
            .verifier
            .verify_and_parse(&cmd.payload, signature)
            .map_err(|e| {
                if e.is_authentication_failure() {
                    tracing::warn!(error = %e, code = e.code(), "Rejected payment webhook signature");
                } else {
                    tracing::warn!(error = %e, code = e.code(), "Rejected malformed payment webhook");
                }
                e
            })?;

        let attempt = self.audit.next_attempt(&envelope.id).await;
        if attempt > 1 {
            tracing::info!(
                event_id = %envelope.id,
                event_type = %envelope.event_type,
                delivery_attempt = attempt,
                "Redelivered payment event"
            );
        }

        // 2. Decode the typed object
        let event = match PaymentEvent::from_stripe(&envelope) {
            Ok(event) => event,
            Err(error) => {
                let failure = Failure {
                    user_id: None,
                    error,
                };
                self.record_failure(&envelope.id, &envelope.event_type, attempt, &failure, Value::Null)
                    .await;
                return Err(failure.error);
            }
        };

        // 3. Resolve, reconcile, reward
        match self.process(&event).await {
            Ok(processed) => {
                tracing::info!(
                    event_id = %envelope.id,
                    event_type = %envelope.event_type,
                    user_id = processed.user_id.as_ref().map(UserId::as_str),
                    updated_fields = ?processed.updated_fields,
                    "Payment event processed"
                );
                self.record_success(&envelope.id, &event, attempt, &processed)
                    .await;

                Ok(HandlePaymentWebhookResult {
                    event_id: envelope.id,
                    event_type: envelope.event_type,
                    outcome: AuditOutcome::Success,
                    user_id: processed.user_id,
                    updated_fields: processed.updated_fields,
                    reward: processed.reward,
                    delivery_attempt: attempt,
                })
            }
            Err(failure) => {
                let customer = event.customer_id().map(|c| json!(c)).unwrap_or(Value::Null);
                self.record_failure(&envelope.id, &envelope.event_type, attempt, &failure, customer)
                    .await;

                match failure.error {
                    // Acknowledged: retrying would not make the user appear.
                    WebhookError::UserNotFound => Ok(HandlePaymentWebhookResult {
                        event_id: envelope.id,
                        event_type: envelope.event_type,
                        outcome: AuditOutcome::Error,
                        user_id: failure.user_id,
                        updated_fields: Vec::new(),
                        reward: None,
                        delivery_attempt: attempt,
                    }),
                    error => Err(error),
                }
            }
        }
    }

    async fn process(&self, event: &PaymentEvent) -> Result<Processed, Failure> {
        if !event.is_handled() {
            return Ok(Processed::default());
        }

        let subscriber = self.resolver.resolve(event).await.map_err(|error| Failure {
            user_id: None,
            error,
        })?;
        let user_id = subscriber.user_id.clone();
        let fail = |error: WebhookError| Failure {
            user_id: Some(user_id.clone()),
            error,
        };

        let fetched = match event.subscription_to_fetch() {
            Some(subscription_id) => self
                .payment_provider
                .get_subscription(subscription_id)
                .await
                .map_err(|e| fail(WebhookError::PaymentProvider(e.message)))?,
            None => None,
        };

        let reconciliation = reconcile(event, &subscriber.record, fetched.as_ref(), Timestamp::now());

        let mut processed = Processed {
            user_id: Some(user_id.clone()),
            matched_by: Some(subscriber.matched_by),
            ..Default::default()
        };
        if reconciliation.patch.is_empty() {
            return Ok(processed);
        }

        let merged = self
            .users
            .merge(&user_id, &reconciliation.patch)
            .await
            .map_err(|e| fail(e.into()))?;
        if !merged {
            return Err(fail(WebhookError::UserNotFound));
        }
        processed.updated_fields = reconciliation.patch.fields();

        if reconciliation.activates_premium {
            match self.reward.grant(&user_id).await {
                Ok(granted) => processed.reward = Some(granted),
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Activation reward failed");
                    processed.reward_error = Some(e.message);
                }
            }
        }

        Ok(processed)
    }

    async fn record_success(
        &self,
        event_id: &str,
        event: &PaymentEvent,
        attempt: u32,
        processed: &Processed,
    ) {
        let mut entry = AuditEntry::success(event_id, event.event_type())
            .with_user(processed.user_id.clone())
            .with_delivery_attempt(attempt)
            .with_detail("handled", event.is_handled())
            .with_detail("updatedFields", processed.updated_fields.clone());

        if let Some(matched_by) = processed.matched_by {
            entry = entry.with_detail("matchedBy", matched_by.as_str());
        }
        if let Some(reward) = &processed.reward {
            entry = entry.with_detail(
                "reward",
                json!({
                    "pontos": reward.points,
                    "nivel": reward.level,
                    "badgeAdded": reward.badge_added,
                }),
            );
        }
        if let Some(error) = &processed.reward_error {
            entry = entry.with_detail("rewardError", error.as_str());
        }

        self.audit.record(entry).await;
    }

    async fn record_failure(
        &self,
        event_id: &str,
        event_type: &str,
        attempt: u32,
        failure: &Failure,
        customer_id: Value,
    ) {
        tracing::error!(
            event_id,
            event_type,
            code = failure.error.code(),
            error = %failure.error,
            "Payment event failed"
        );

        let mut entry = AuditEntry::error(event_id, event_type)
            .with_user(failure.user_id.clone())
            .with_delivery_attempt(attempt)
            .with_detail("errorCode", failure.error.code())
            .with_detail("error", failure.error.to_string());
        if !customer_id.is_null() {
            entry = entry.with_detail("customerId", customer_id);
        }

        self.audit.record(entry).await;
    }
}
