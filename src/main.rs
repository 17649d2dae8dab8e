mod config;
mod db;
mod emailjs;
mod errors;
mod form;
mod gate;
mod handlers;
mod models;
mod relay;
mod storage;
mod turnstile;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection and schema.
/// - External API clients (Turnstile, EmailJS).
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "echoweb_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool (the acceptance channel)
    let database = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");
    database.ensure_schema().await?;
    tracing::info!("Lead storage schema ready");

    // Initialize bot-verification client
    let turnstile = match turnstile::TurnstileClient::new(&config) {
        Ok(client) => {
            tracing::info!("✓ Turnstile client initialized: {}", config.turnstile_base_url);
            Some(client)
        }
        Err(e) => {
            tracing::error!("Failed to initialize Turnstile client: {}", e);
            None
        }
    };

    // Initialize email-delivery client; absence degrades the email channel
    let emailjs = match emailjs::EmailJsClient::from_config(&config) {
        Some(Ok(client)) => {
            tracing::info!("✓ EmailJS client initialized: {}", config.emailjs_base_url);
            Some(client)
        }
        Some(Err(e)) => {
            tracing::error!("Failed to initialize EmailJS client: {}", e);
            None
        }
        None => None,
    };

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: database.pool.clone(),
        config: config.clone(),
        turnstile,
        emailjs,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Lead acceptance endpoint
        .route("/api/v1/leads", post(handlers::submit_lead))
        // Bot-verification endpoints
        .route(
            "/api/v1/turnstile/verify",
            post(handlers::verify_turnstile),
        )
        .route("/api/v1/turnstile/config", get(handlers::turnstile_config))
        // Gated-resource endpoints
        .route("/api/v1/resources/:slug", get(handlers::resource_access))
        .route(
            "/api/v1/resources/:slug/unlock",
            post(handlers::unlock_resource),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20 (prevents DDoS)
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting for Fly.io)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
