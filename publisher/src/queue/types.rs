//! Queue message types for ticket notifications.
//!
//! A single durable queue carries every notification request. Downstream
//! consumers decode the JSON body and route on the `type` field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default name of the durable queue that receives ticket notifications.
pub const TICKETS_QUEUE: &str = "tickets-queue";

/// Notification kind for confirmation emails.
pub const CREATE_EMAIL: &str = "create-email";

/// Notification kind for confirmation text messages.
pub const CREATE_SMS: &str = "create-sms";

// =============================================================================
// Event / User
// =============================================================================

/// The event an attendee registers for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub address: String,
    pub description: String,
    pub price: String,
}

/// Attendee contact details as entered in the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub phone: String,
}

// =============================================================================
// Ticket Message (tickets-queue)
// =============================================================================

/// One notification request published to the tickets queue.
///
/// The publisher treats this as opaque: nothing is validated or normalized
/// before it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub event: Event,
    pub user: User,
    /// Notification kind, e.g. `create-email` or `create-sms`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// ISO-8601 creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TicketMessage {
    /// Create an untyped, untimestamped message.
    pub fn new(event: Event, user: User) -> Self {
        Self {
            event,
            user,
            kind: None,
            timestamp: None,
        }
    }

    /// Tag the message with a notification kind.
    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind.as_str().to_string());
        self
    }

    /// Set the ISO-8601 timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Parsed notification kind, if the `type` field holds a known one.
    pub fn notification_kind(&self) -> Option<NotificationKind> {
        self.kind.as_deref().and_then(NotificationKind::parse)
    }
}

/// Known notification kinds understood by the downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Email,
    Sms,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Email => CREATE_EMAIL,
            NotificationKind::Sms => CREATE_SMS,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            CREATE_EMAIL => Some(NotificationKind::Email),
            CREATE_SMS => Some(NotificationKind::Sms),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) fn sample_message() -> TicketMessage {
    TicketMessage::new(
        Event {
            name: "Tech Conference 2024".to_string(),
            date: "December 15, 2024".to_string(),
            time: "09:00 - 18:00".to_string(),
            location: "São Paulo Convention Center".to_string(),
            address: "Av. Paulista, 1000 - Bela Vista, São Paulo - SP".to_string(),
            description: "The biggest technology conference in Brazil.".to_string(),
            price: "$299.00".to_string(),
        },
        User {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: "11999999999".to_string(),
        },
    )
}
