//! Exam Prep Billing server
//!
//! Loads configuration, wires the storage and payment adapters, and serves
//! the webhook, checkout, portal and health endpoints.

#![deny(clippy::unwrap_used, clippy::expect_used)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exam_prep_billing::adapters::http::{billing_router, BillingAppState};
use exam_prep_billing::adapters::memory::{InMemoryAuditLog, InMemoryUserRepository};
use exam_prep_billing::adapters::postgres::{
    run_migrations, PostgresAuditLog, PostgresUserRepository,
};
use exam_prep_billing::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use exam_prep_billing::application::handlers::billing::BillingUrls;
use exam_prep_billing::config::{AppConfig, LogFormat, ServerConfig};
use exam_prep_billing::domain::billing::StripeWebhookVerifier;
use exam_prep_billing::ports::{AuditLog, UserRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Starting exam prep billing server"
    );

    let (user_repository, audit_log) = storage(&config).await?;

    let mut stripe_config = StripeConfig::new(config.payment.stripe_api_key.clone());
    if let Some(base_url) = &config.payment.stripe_api_base_url {
        stripe_config = stripe_config.with_base_url(base_url.clone());
    }
    let payment_provider = Arc::new(StripePaymentAdapter::new(stripe_config)?);

    let webhook_verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
        .with_tolerance_secs(config.payment.webhook_tolerance_secs)
        .with_require_livemode(config.payment.require_livemode);

    let state = BillingAppState {
        user_repository,
        audit_log,
        payment_provider,
        webhook_verifier,
        urls: BillingUrls::from_base(&config.payment.app_base_url),
    };

    let app = billing_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Postgres when a database is configured, otherwise in-memory stores.
async fn storage(
    config: &AppConfig,
) -> Result<(Arc<dyn UserRepository>, Arc<dyn AuditLog>), Box<dyn Error>> {
    let Some(database) = &config.database else {
        if config.is_production() {
            tracing::error!("No database configured in production; state will not survive restarts");
        } else {
            tracing::warn!("No database configured; using in-memory stores");
        }
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let audit_log: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());
        return Ok((users, audit_log));
    };

    let pool = database.pool_options().connect(&database.url).await?;
    tracing::info!(
        max_connections = database.max_connections,
        "Database connection established"
    );

    if database.run_migrations {
        run_migrations(&pool, Path::new(&database.migrations_dir)).await?;
    }

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let audit_log: Arc<dyn AuditLog> = Arc::new(PostgresAuditLog::new(pool));
    Ok((users, audit_log))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
