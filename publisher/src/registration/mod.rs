//! Event registration.
//!
//! This is the caller of the queue publisher. It never lets a publish error
//! escape: every outcome becomes a [`RegistrationResult`], and the specific
//! error kind is only logged.
//!
//! ## Flow
//!
//! ```text
//! RegistrationForm → build_notifications() → [create-email, create-sms]
//!                  → dispatch() → RegistrationResult
//! ```

pub mod dispatch;
pub mod event;
pub mod form;

use serde::{Deserialize, Serialize};

pub use dispatch::{publish_with_retry, RegistrationService};
pub use event::{featured_event, EventListing};
pub use form::{build_notifications, iso_timestamp, normalize_phone, RegistrationForm};

/// Status text returned when every notification was published.
pub const SENT_MESSAGE: &str = "Registration sent successfully";

/// Status text returned on any failure.
pub const FAILED_MESSAGE: &str = "Failed to send registration";

/// Outcome shown to the registering user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub success: bool,
    pub message: String,
}

impl RegistrationResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: SENT_MESSAGE.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: FAILED_MESSAGE.to_string(),
        }
    }

    /// Combine independent outcomes: success only if all succeeded.
    pub fn all(results: impl IntoIterator<Item = RegistrationResult>) -> Self {
        if results.into_iter().all(|r| r.success) {
            Self::sent()
        } else {
            Self::failed()
        }
    }
}
