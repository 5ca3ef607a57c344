//! Elida Storefront - tanning products shop.
//!
//! This binary serves the storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, Askama templates rendered on the server
//! - Firebase Auth and Firestore over their REST APIs for identity, catalog,
//!   orders and bookings
//! - In-memory sessions holding the signed-in user, cart and wishlist
//!
//! `STOREFRONT_BACKEND=memory` swaps Firebase for in-process backends seeded
//! with demo products.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::process::ExitCode;

use elida_storefront::app;
use elida_storefront::config::{BackendConfig, ConfigError, StorefrontConfig};
use elida_storefront::state::{AppState, StateError};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Failures after configuration has loaded.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("application state: {0}")]
    State(#[from] StateError),
    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Sentry needs the DSN before the subscriber is installed.
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "elida_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Storefront stopped");
            ExitCode::FAILURE
        }
    }
}

/// Runs before the subscriber exists, so the error goes straight to stderr.
#[allow(clippy::print_stderr)]
fn report_config_error(e: &ConfigError) {
    eprintln!("elida-storefront: {e}");
}

async fn serve(config: StorefrontConfig) -> Result<(), StartupError> {
    let addr = config.socket_addr();
    let demo = matches!(config.backend, BackendConfig::Memory { .. });
    let state = AppState::new(config).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, demo, "Storefront listening");

    // Connection info is the rate limiter's fallback key.
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down, draining open requests");
}
