//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `EXAM_PREP` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use exam_prep_billing::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Listening on {}", config.server.socket_addr()?);
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Absent: user records and the audit log are kept in memory
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// 1. Loads `.env` if present
    /// 2. Reads `EXAM_PREP__*` variables, `__` separating nested keys
    ///
    /// - `EXAM_PREP__SERVER__PORT=8080` -> `server.port`
    /// - `EXAM_PREP__PAYMENT__STRIPE_API_KEY=sk_test_...` -> `payment.stripe_api_key`
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadError` when a required value is missing or cannot
    /// be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("EXAM_PREP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic checks: key prefixes, ports, timeouts, URLs, pool sizes
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("EXAM_PREP__PAYMENT__STRIPE_API_KEY", "sk_test_xxx"),
        ("EXAM_PREP__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx"),
        ("EXAM_PREP__PAYMENT__APP_BASE_URL", "https://app.example.com"),
    ];

    fn with_env<T>(extra: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in VARS.iter().chain(extra) {
            env::set_var(key, value);
        }
        let result = f();
        for (key, _) in VARS.iter().chain(extra) {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn loads_minimal_environment() {
        let config = with_env(&[], AppConfig::load).unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payment.webhook_tolerance_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_overrides() {
        let config = with_env(
            &[
                ("EXAM_PREP__SERVER__PORT", "3000"),
                ("EXAM_PREP__SERVER__ENVIRONMENT", "production"),
                ("EXAM_PREP__SERVER__LOG_FORMAT", "json"),
                ("EXAM_PREP__DATABASE__URL", "postgres://localhost/billing"),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(
            config.database.map(|d| d.url),
            Some("postgres://localhost/billing".to_string())
        );
    }
}
