//! Broker transport abstraction.
//!
//! The publisher drives the broker through this trait so the connection
//! lifecycle can be exercised against an in-memory broker in tests and swapped
//! for RabbitMQ in production.

use async_trait::async_trait;

use super::error::QueueError;

/// A single message ready to be handed to the broker.
#[derive(Debug, Clone, Copy)]
pub struct Outgoing<'a> {
    /// Encoded message body
    pub body: &'a [u8],
    /// Notification kind, sent as the AMQP `type` property
    pub kind: Option<&'a str>,
    /// Message identifier for tracing across services
    pub message_id: Option<&'a str>,
    /// Unix timestamp in seconds
    pub timestamp: Option<u64>,
}

impl<'a> Outgoing<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            kind: None,
            message_id: None,
            timestamp: None,
        }
    }
}

/// Operations the publisher needs from a message broker.
///
/// Implementations map their native failures onto [`QueueError`]:
/// `connect` yields `Connection`, channel and declaration steps yield
/// `Channel`, and `send` yields `Publish`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Transport-level link to the broker.
    type Connection: Send + Sync + 'static;
    /// Logical channel multiplexed over a connection.
    type Channel: Clone + Send + Sync + 'static;

    async fn connect(&self, url: &str) -> Result<Self::Connection, QueueError>;

    async fn open_channel(
        &self,
        connection: &Self::Connection,
    ) -> Result<Self::Channel, QueueError>;

    /// Declare `queue`. Must be a no-op when it already exists with the same
    /// durability.
    async fn declare_queue(
        &self,
        channel: &Self::Channel,
        queue: &str,
        durable: bool,
    ) -> Result<(), QueueError>;

    async fn send(
        &self,
        channel: &Self::Channel,
        queue: &str,
        message: Outgoing<'_>,
    ) -> Result<(), QueueError>;

    async fn close_channel(&self, channel: &Self::Channel) -> Result<(), QueueError>;

    async fn close_connection(&self, connection: &Self::Connection) -> Result<(), QueueError>;
}
