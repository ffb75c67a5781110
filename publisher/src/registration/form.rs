//! Registration form handling.
//!
//! Turns one submitted form into the notification messages that are published
//! for it. Normalization happens here, never in the publisher.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::queue::{Event, NotificationKind, TicketMessage, User};

/// A submitted registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    /// Event being registered for; the featured event when omitted
    #[serde(default)]
    pub event: Option<Event>,
    pub user: User,
}

/// Normalize a phone number to E.164-style `+<country><digits>`.
///
/// Every non-digit is dropped and the country code is prepended as is.
pub fn normalize_phone(country_code: &str, raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    format!("+{country_code}{digits}")
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the email and SMS notifications for one registration.
///
/// Both messages carry the same timestamp. Only the SMS message gets the
/// normalized phone number.
pub fn build_notifications(
    event: Event,
    user: User,
    country_code: &str,
    at: DateTime<Utc>,
) -> Vec<TicketMessage> {
    let timestamp = iso_timestamp(at);

    let email = TicketMessage::new(event.clone(), user.clone())
        .with_kind(NotificationKind::Email)
        .with_timestamp(timestamp.clone());

    let sms_user = User {
        phone: normalize_phone(country_code, &user.phone),
        ..user
    };
    let sms = TicketMessage::new(event, sms_user)
        .with_kind(NotificationKind::Sms)
        .with_timestamp(timestamp);

    vec![email, sms]
}
