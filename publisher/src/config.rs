//! Configuration module for environment variable parsing.
//!
//! Every setting comes from the environment. The broker URL has no default:
//! its absence is reported when the publisher first tries to connect.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::queue::TICKETS_QUEUE;
use crate::util::RetryPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// RabbitMQ connection URL
    pub rabbitmq_url: Option<String>,

    /// Name of the durable queue receiving ticket notifications
    pub queue_name: String,

    /// Deadline for connecting, opening the channel, and declaring the queue
    pub connect_timeout_ms: u64,

    /// Deadline for a single publish including the broker confirm
    pub publish_timeout_ms: u64,

    /// Attempts per notification dispatch (1 disables retries)
    pub publish_max_attempts: u32,

    /// Backoff range in milliseconds between attempts (base, max)
    pub retry_backoff_ms: (u64, u64),

    /// Country calling code prepended to SMS phone numbers
    pub phone_country_code: String,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            rabbitmq_url: env::var("RABBITMQ_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            queue_name: env::var("TICKETS_QUEUE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| TICKETS_QUEUE.to_string()),

            connect_timeout_ms: parse_number("CONNECT_TIMEOUT_MS", 10_000),

            publish_timeout_ms: parse_number("PUBLISH_TIMEOUT_MS", 5_000),

            publish_max_attempts: parse_number("PUBLISH_MAX_ATTEMPTS", 1),

            retry_backoff_ms: parse_range("RETRY_BACKOFF_MS", (200, 2000)),

            phone_country_code: env::var("PHONE_COUNTRY_CODE")
                .ok()
                .map(|v| v.chars().filter(char::is_ascii_digit).collect::<String>())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "55".to_string()),

            port: parse_number("PORT", 8080),
        }
    }

    /// Settings the queue publisher owns.
    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            url: self.rabbitmq_url.clone(),
            queue: self.queue_name.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
        }
    }

    /// Caller-side retry policy for notification dispatch.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.publish_max_attempts,
            Duration::from_millis(self.retry_backoff_ms.0),
            Duration::from_millis(self.retry_backoff_ms.1),
        )
    }
}

/// Connection settings for a [`Publisher`](crate::queue::Publisher).
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Broker URL; `None` fails the first connection attempt
    pub url: Option<String>,
    /// Target durable queue
    pub queue: String,
    pub connect_timeout: Duration,
    pub publish_timeout: Duration,
}

impl PublisherConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            url: None,
            queue: TICKETS_QUEUE.to_string(),
            connect_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// Parse a numeric variable, warning and falling back on bad input.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid number, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse a comma-separated range like "200,2000" into a tuple.
fn parse_range(name: &str, default: (u64, u64)) -> (u64, u64) {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        warn!(env_var = name, value = %raw, "Invalid range format, using default");
        return default;
    }

    let min = parts[0].trim().parse::<u64>();
    let max = parts[1].trim().parse::<u64>();

    match (min, max) {
        (Ok(min), Ok(max)) if min <= max => (min, max),
        _ => {
            warn!(env_var = name, value = %raw, "Invalid range values, using default");
            default
        }
    }
}
