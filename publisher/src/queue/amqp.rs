//! RabbitMQ transport using lapin.

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tracing::{debug, warn};

use super::error::QueueError;
use super::transport::{Outgoing, Transport};

/// AMQP 0-9-1 transport backed by a lapin connection.
#[derive(Debug, Clone)]
pub struct AmqpTransport {
    publisher_confirms: bool,
}

impl AmqpTransport {
    /// Transport with publisher confirms enabled, so broker nacks surface as
    /// publish errors.
    pub fn new() -> Self {
        Self {
            publisher_confirms: true,
        }
    }

    /// Toggle publisher confirms on channels opened by this transport.
    pub fn with_publisher_confirms(mut self, enabled: bool) -> Self {
        self.publisher_confirms = enabled;
        self
    }
}

impl Default for AmqpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for AmqpTransport {
    type Connection = Connection;
    type Channel = Channel;

    async fn connect(&self, url: &str) -> Result<Connection, QueueError> {
        Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| QueueError::Connection(format!("Failed to connect to RabbitMQ: {e}")))
    }

    async fn open_channel(&self, connection: &Connection) -> Result<Channel, QueueError> {
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| QueueError::Channel(format!("Failed to create channel: {e}")))?;

        if self.publisher_confirms {
            channel
                .confirm_select(ConfirmSelectOptions::default())
                .await
                .map_err(|e| {
                    QueueError::Channel(format!("Failed to enable publisher confirms: {e}"))
                })?;
        }

        Ok(channel)
    }

    async fn declare_queue(
        &self,
        channel: &Channel,
        queue: &str,
        durable: bool,
    ) -> Result<(), QueueError> {
        let declared = channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::Channel(format!("Failed to declare queue {queue}: {e}")))?;

        debug!(
            queue = queue,
            message_count = declared.message_count(),
            consumer_count = declared.consumer_count(),
            "rabbitmq_queue_declare_ok"
        );

        Ok(())
    }

    async fn send(
        &self,
        channel: &Channel,
        queue: &str,
        message: Outgoing<'_>,
    ) -> Result<(), QueueError> {
        let mut properties = BasicProperties::default()
            .with_delivery_mode(2) // Persistent
            .with_content_type("application/json".into());

        if let Some(kind) = message.kind {
            properties = properties.with_kind(kind.into());
        }
        if let Some(message_id) = message.message_id {
            properties = properties.with_message_id(message_id.into());
        }
        if let Some(timestamp) = message.timestamp {
            properties = properties.with_timestamp(timestamp);
        }

        let confirmation = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                message.body,
                properties,
            )
            .await
            .map_err(|e| QueueError::Publish(format!("Failed to publish to {queue}: {e}")))?
            .await
            .map_err(|e| QueueError::Publish(format!("Failed to confirm publish: {e}")))?;

        if confirmation.is_nack() {
            warn!(queue = queue, "rabbitmq_publish_nacked");
            return Err(QueueError::Publish(format!(
                "Broker rejected message for {queue}"
            )));
        }

        Ok(())
    }

    async fn close_channel(&self, channel: &Channel) -> Result<(), QueueError> {
        channel
            .close(200, "Normal shutdown")
            .await
            .map_err(|e| QueueError::Channel(format!("Failed to close channel: {e}")))
    }

    async fn close_connection(&self, connection: &Connection) -> Result<(), QueueError> {
        connection
            .close(200, "Normal shutdown")
            .await
            .map_err(|e| QueueError::Connection(format!("Failed to close connection: {e}")))
    }
}
