//! Utility modules.

pub mod backoff;
pub mod broker_url;

pub use backoff::RetryPolicy;
pub use broker_url::{parse_broker_url, redact};
