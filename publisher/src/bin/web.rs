//! Tickets Web Server - Event registration endpoint.
//!
//! This binary provides a thin web server that:
//! - Serves the event open for registration
//! - Accepts attendee registrations
//! - Publishes email and SMS notifications to RabbitMQ
//!
//! Notification delivery happens in a downstream consumer.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tickets::web::{router, AppState};
use tickets::{Config, Publisher, RegistrationService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        rabbitmq_url_set = config.rabbitmq_url.is_some(),
        queue = %config.queue_name,
        publish_max_attempts = config.publish_max_attempts,
        "config_loaded"
    );

    // The broker connection is made lazily on the first registration
    let publisher = Publisher::new(config.publisher());
    let registrations = RegistrationService::new(
        publisher.clone(),
        config.retry_policy(),
        config.phone_country_code.clone(),
    );
    info!(queue = publisher.queue(), "rabbitmq_publisher_created");

    let state = AppState::new(config.clone(), registrations);
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Close publisher connection
    if let Err(e) = publisher.close().await {
        warn!(error_kind = %e.kind(), error = %e, "rabbitmq_publisher_close_failed");
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
