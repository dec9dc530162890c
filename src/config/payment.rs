//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Stripe credentials and webhook settings
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Secret API key (`sk_test_...` or `sk_live_...`)
    pub stripe_api_key: String,

    /// Webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    /// Frontend base URL used for checkout and portal redirects
    pub app_base_url: String,

    /// Overrides the Stripe API host (stripe-mock, tests)
    #[serde(default)]
    pub stripe_api_base_url: Option<String>,

    /// Maximum accepted age of a signed webhook
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,

    /// Reject test-mode events
    #[serde(default)]
    pub require_livemode: bool,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.app_base_url.starts_with("https://") && !self.app_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidAppBaseUrl);
        }
        if !(1..=3600).contains(&self.webhook_tolerance_secs) {
            return Err(ValidationError::InvalidWebhookTolerance);
        }
        if self.require_livemode && self.is_test_mode() {
            return Err(ValidationError::LiveKeyRequired);
        }
        Ok(())
    }
}

fn default_webhook_tolerance() -> i64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: "sk_test_abc".to_string(),
            stripe_webhook_secret: "whsec_abc".to_string(),
            app_base_url: "https://app.example.com".to_string(),
            stripe_api_base_url: None,
            webhook_tolerance_secs: 300,
            require_livemode: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
        assert!(valid().is_test_mode());
    }

    #[test]
    fn publishable_key_is_rejected() {
        let config = PaymentConfig {
            stripe_api_key: "pk_test_abc".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn webhook_secret_needs_prefix() {
        let config = PaymentConfig {
            stripe_webhook_secret: "secret".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeWebhookSecret));
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let config = PaymentConfig {
            app_base_url: "/premium".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidAppBaseUrl));
    }

    #[test]
    fn livemode_with_test_key_is_rejected() {
        let config = PaymentConfig {
            require_livemode: true,
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::LiveKeyRequired));
    }

    #[test]
    fn tolerance_bounds() {
        let config = PaymentConfig {
            webhook_tolerance_secs: 0,
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookTolerance));
    }
}
