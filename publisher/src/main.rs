//! Tickets Register - One-shot registration from the command line.
//!
//! Reads a registration form as JSON from stdin, publishes its email and SMS
//! notifications, prints the combined result, and closes the broker
//! connection. Exits non-zero if the registration failed.
//!
//! ```text
//! echo '{"user":{"name":"Ana","email":"ana@x.com","phone":"11999999999"}}' | tickets-register
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tickets::{Config, Publisher, RegistrationForm, RegistrationService};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only the result
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        rabbitmq_url_set = config.rabbitmq_url.is_some(),
        queue = %config.queue_name,
        "config_loaded"
    );

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("Failed to read registration from stdin")?;
    let form: RegistrationForm =
        serde_json::from_str(&raw).context("Failed to parse registration form")?;

    let publisher = Publisher::new(config.publisher());
    let registrations = RegistrationService::new(
        publisher.clone(),
        config.retry_policy(),
        config.phone_country_code.clone(),
    );

    let result = registrations.register(form).await;

    if let Err(e) = publisher.close().await {
        warn!(error_kind = %e.kind(), error = %e, "rabbitmq_publisher_close_failed");
    }

    println!(
        "{}",
        serde_json::to_string(&result).context("Failed to encode result")?
    );

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
