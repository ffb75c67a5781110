//! Tickets - Event registration with queued notifications.
//!
//! This library provides shared modules for the two binaries:
//! - `tickets-web`: Web server accepting registrations
//! - `tickets-register`: One-shot registration from stdin
//!
//! ## Architecture
//!
//! ```text
//! Registration → Publisher → tickets-queue → notification consumer (email / SMS)
//! ```

pub mod config;
pub mod queue;
pub mod registration;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::{Config, PublisherConfig};
pub use queue::{
    AmqpTransport, ErrorKind, Event, NotificationKind, Publisher, QueueError, TicketMessage,
    Transport, User, TICKETS_QUEUE,
};
#[cfg(any(test, feature = "memory"))]
pub use queue::MemoryTransport;
pub use registration::{RegistrationForm, RegistrationResult, RegistrationService};
pub use web::AppState;
