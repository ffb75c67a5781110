//! Queue module for broker operations.
//!
//! This module provides:
//! - Message types for the tickets queue
//! - A transport trait with a RabbitMQ implementation, plus an in-memory
//!   broker for tests (`memory` feature)
//! - An async publisher sharing one lazily established session
//!
//! ## Architecture
//!
//! ```text
//! Registration → Publisher → Transport → tickets-queue → notification consumer
//! ```

pub mod amqp;
pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod publisher;
pub mod transport;
pub mod types;

pub use amqp::AmqpTransport;
pub use error::{ErrorKind, QueueError};
#[cfg(any(test, feature = "memory"))]
pub use memory::{Faults, MemoryTransport, StoredMessage};
pub use publisher::Publisher;
pub use transport::{Outgoing, Transport};
pub use types::{
    Event, NotificationKind, TicketMessage, User, CREATE_EMAIL, CREATE_SMS, TICKETS_QUEUE,
};
