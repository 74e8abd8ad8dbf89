//! Fitness Assistant auth web service
//!
//! Serves the sign-in and sign-up pages, guards the app sections, and
//! delegates every credential operation to the hosted identity provider.

use anyhow::Result;
use fitness_auth_web::{config, identity::GoTrueClient, routes, state::AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Fitness Assistant auth web"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    info!(url = %config.identity.url, "Using identity provider");
    let identity = GoTrueClient::new(&config.identity)?;

    let state = AppState::new(Arc::new(identity), config.clone());
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "fitness_auth_web=info,tower_http=info".into()
        } else {
            "fitness_auth_web=debug,tower_http=debug,reqwest=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.identity.anon_key.trim().is_empty() {
        errors.push("identity.anon_key must be set (FA__IDENTITY__ANON_KEY)");
    }

    if !config.session.secure {
        errors.push("session.secure must be true so cookies are only sent over HTTPS");
    }

    if !config.identity.url.starts_with("https://") {
        warn!("Identity provider URL is not HTTPS - ensure this is intentional for production");
    }

    if config.guard.on_lookup_error == config::LookupFailureMode::Open {
        warn!("Route guard fails open when the identity provider is unreachable");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
