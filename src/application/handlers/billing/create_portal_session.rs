//! CreatePortalSessionHandler - opens the provider's self-service billing portal.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::UserId;
use crate::ports::{PaymentProvider, UserRepository};

#[derive(Debug, Clone)]
pub struct CreatePortalSessionCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct CreatePortalSessionResult {
    pub url: String,
}

pub struct CreatePortalSessionHandler {
    users: Arc<dyn UserRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    return_url: String,
}

impl CreatePortalSessionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            payment_provider,
            return_url: return_url.into(),
        }
    }

    /// # Errors
    ///
    /// - `UserNotFound` - no record for the user
    /// - `NoBillingAccount` - the user never reached checkout
    pub async fn handle(
        &self,
        cmd: CreatePortalSessionCommand,
    ) -> Result<CreatePortalSessionResult, BillingError> {
        let record = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::UserNotFound(cmd.user_id.clone()))?;

        let customer_id = record
            .stripe_customer_id
            .ok_or_else(|| BillingError::NoBillingAccount(cmd.user_id.clone()))?;

        let session = self
            .payment_provider
            .create_portal_session(&customer_id, &self.return_url)
            .await
            .map_err(|e| BillingError::payment_provider(e.message))?;

        tracing::info!(user_id = %cmd.user_id, customer_id = %customer_id, "Portal session created");

        Ok(CreatePortalSessionResult { url: session.url })
    }
}
