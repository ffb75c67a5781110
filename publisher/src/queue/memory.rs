//! In-process broker implementing [`Transport`].
//!
//! Used by tests and local runs without RabbitMQ. Queues hold the raw bytes
//! that were published so a reader can decode them like a downstream consumer
//! would. Faults can be injected per step to exercise the error paths.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::error::QueueError;
use super::transport::{Outgoing, Transport};

/// A message stored in an in-memory queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub body: Vec<u8>,
    pub kind: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<u64>,
}

/// Failures to inject into the next operations of each kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub refuse_connect: bool,
    pub fail_channel: bool,
    pub fail_declare: bool,
    pub fail_send: bool,
    /// Reject sends whose notification kind matches
    pub reject_kind: Option<&'static str>,
    /// Never answer channel opens
    pub hang_channel: bool,
    /// Never answer connection closes
    pub hang_close: bool,
}

/// Cheaply cloneable handle to a shared in-memory broker.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    broker: Arc<Broker>,
}

#[derive(Default)]
struct Broker {
    state: Mutex<BrokerState>,
    connect_attempts: AtomicUsize,
    connections_opened: AtomicUsize,
    channels_opened: AtomicUsize,
    declarations: AtomicUsize,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, MemoryQueue>,
    faults: Faults,
    connect_delay: Option<Duration>,
    send_delay: Option<Duration>,
}

struct MemoryQueue {
    durable: bool,
    messages: VecDeque<StoredMessage>,
}

/// Connection handle issued by [`MemoryTransport`].
#[derive(Debug)]
pub struct MemoryConnection {
    pub id: usize,
    open: AtomicBool,
}

/// Channel handle issued by [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    pub id: usize,
    pub connection_id: usize,
    open: Arc<AtomicBool>,
}

impl MemoryChannel {
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        // A panicking test thread must not take the broker down with it.
        self.broker
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the injected faults.
    pub fn set_faults(&self, faults: Faults) {
        self.state().faults = faults;
    }

    /// Delay every connection attempt, widening the window for racing callers.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state().connect_delay = Some(delay);
    }

    /// Delay every send, as a slow broker confirm would.
    pub fn set_send_delay(&self, delay: Duration) {
        self.state().send_delay = Some(delay);
    }

    /// Create a queue out of band, as another client would.
    pub fn declare_existing(&self, queue: &str, durable: bool) {
        self.state()
            .queues
            .entry(queue.to_string())
            .or_insert_with(|| MemoryQueue {
                durable,
                messages: VecDeque::new(),
            });
    }

    /// Remove and return every message currently in `queue`.
    pub fn drain(&self, queue: &str) -> Vec<StoredMessage> {
        self.state()
            .queues
            .get_mut(queue)
            .map(|q| q.messages.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn queue_len(&self, queue: &str) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.messages.len())
            .unwrap_or(0)
    }

    pub fn queue_count(&self) -> usize {
        self.state().queues.len()
    }

    pub fn is_durable(&self, queue: &str) -> Option<bool> {
        self.state().queues.get(queue).map(|q| q.durable)
    }

    pub fn connect_attempts(&self) -> usize {
        self.broker.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn connections_opened(&self) -> usize {
        self.broker.connections_opened.load(Ordering::SeqCst)
    }

    pub fn channels_opened(&self) -> usize {
        self.broker.channels_opened.load(Ordering::SeqCst)
    }

    pub fn declarations(&self) -> usize {
        self.broker.declarations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    type Connection = MemoryConnection;
    type Channel = MemoryChannel;

    async fn connect(&self, url: &str) -> Result<MemoryConnection, QueueError> {
        self.broker.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let (delay, refuse) = {
            let state = self.state();
            (state.connect_delay, state.faults.refuse_connect)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if refuse {
            return Err(QueueError::Connection(format!(
                "Connection refused by broker at {url}"
            )));
        }

        let id = self.broker.connections_opened.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(connection_id = id, "memory_broker_connection_opened");

        Ok(MemoryConnection {
            id,
            open: AtomicBool::new(true),
        })
    }

    async fn open_channel(
        &self,
        connection: &MemoryConnection,
    ) -> Result<MemoryChannel, QueueError> {
        let faults = self.state().faults;
        if faults.hang_channel {
            std::future::pending::<()>().await;
        }
        if faults.fail_channel {
            return Err(QueueError::Channel("Channel open rejected".to_string()));
        }
        if !connection.open.load(Ordering::SeqCst) {
            return Err(QueueError::Channel("Connection is closed".to_string()));
        }

        let id = self.broker.channels_opened.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(MemoryChannel {
            id,
            connection_id: connection.id,
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    async fn declare_queue(
        &self,
        channel: &MemoryChannel,
        queue: &str,
        durable: bool,
    ) -> Result<(), QueueError> {
        if !channel.is_open() {
            return Err(QueueError::Channel("Channel is closed".to_string()));
        }

        let mut state = self.state();
        if state.faults.fail_declare {
            return Err(QueueError::Channel(format!("Failed to declare queue {queue}")));
        }

        match state.queues.get(queue) {
            Some(existing) if existing.durable != durable => {
                return Err(QueueError::Channel(format!(
                    "PRECONDITION_FAILED - inequivalent arg 'durable' for queue '{queue}'"
                )));
            }
            Some(_) => {}
            None => {
                state.queues.insert(
                    queue.to_string(),
                    MemoryQueue {
                        durable,
                        messages: VecDeque::new(),
                    },
                );
            }
        }

        self.broker.declarations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(
        &self,
        channel: &MemoryChannel,
        queue: &str,
        message: Outgoing<'_>,
    ) -> Result<(), QueueError> {
        if !channel.is_open() {
            return Err(QueueError::Publish("Channel is closed".to_string()));
        }

        let delay = self.state().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let rejected = match (state.faults.reject_kind, message.kind) {
            (Some(rejected), Some(kind)) => rejected == kind,
            _ => false,
        };
        if state.faults.fail_send || rejected {
            return Err(QueueError::Publish(format!("Broker rejected message for {queue}")));
        }

        let target = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::Publish(format!("NOT_FOUND - no queue '{queue}'")))?;

        target.messages.push_back(StoredMessage {
            body: message.body.to_vec(),
            kind: message.kind.map(str::to_string),
            message_id: message.message_id.map(str::to_string),
            timestamp: message.timestamp,
        });

        Ok(())
    }

    async fn close_channel(&self, channel: &MemoryChannel) -> Result<(), QueueError> {
        if !channel.open.swap(false, Ordering::SeqCst) {
            return Err(QueueError::Channel("Channel already closed".to_string()));
        }
        Ok(())
    }

    async fn close_connection(&self, connection: &MemoryConnection) -> Result<(), QueueError> {
        let hang = self.state().faults.hang_close;
        if hang {
            std::future::pending::<()>().await;
        }
        if !connection.open.swap(false, Ordering::SeqCst) {
            return Err(QueueError::Connection("Connection already closed".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_declare_same_queue_twice_is_noop() {
        let transport = MemoryTransport::new();
        let conn = transport.connect("amqp://memory").await.unwrap();
        let channel = transport.open_channel(&conn).await.unwrap();

        transport.declare_queue(&channel, "tickets-queue", true).await.unwrap();
        transport.declare_queue(&channel, "tickets-queue", true).await.unwrap();

        assert_eq!(transport.queue_count(), 1);
        assert_eq!(transport.declarations(), 2);
        assert_eq!(transport.is_durable("tickets-queue"), Some(true));
    }

    #[tokio::test]
    async fn test_declare_with_mismatched_durability_fails() {
        let transport = MemoryTransport::new();
        transport.declare_existing("tickets-queue", false);

        let conn = transport.connect("amqp://memory").await.unwrap();
        let channel = transport.open_channel(&conn).await.unwrap();

        let err = transport
            .declare_queue(&channel, "tickets-queue", true)
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Channel(_)));
    }

    #[tokio::test]
    async fn test_send_to_undeclared_queue_fails() {
        let transport = MemoryTransport::new();
        let conn = transport.connect("amqp://memory").await.unwrap();
        let channel = transport.open_channel(&conn).await.unwrap();

        let err = transport
            .send(&channel, "missing", Outgoing::new(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Publish(_)));
    }

    #[tokio::test]
    async fn test_send_on_closed_channel_fails() {
        let transport = MemoryTransport::new();
        let conn = transport.connect("amqp://memory").await.unwrap();
        let channel = transport.open_channel(&conn).await.unwrap();
        transport.declare_queue(&channel, "q", true).await.unwrap();

        transport.close_channel(&channel).await.unwrap();
        assert!(transport.close_channel(&channel).await.is_err());

        let err = transport
            .send(&channel, "q", Outgoing::new(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Publish(_)));
        assert_eq!(transport.queue_len("q"), 0);
    }

    #[tokio::test]
    async fn test_drain_returns_messages_in_order() {
        let transport = MemoryTransport::new();
        let conn = transport.connect("amqp://memory").await.unwrap();
        let channel = transport.open_channel(&conn).await.unwrap();
        transport.declare_queue(&channel, "q", true).await.unwrap();

        for body in [&b"1"[..], &b"2"[..], &b"3"[..]] {
            transport.send(&channel, "q", Outgoing::new(body)).await.unwrap();
        }

        let bodies: Vec<Vec<u8>> = transport.drain("q").into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
        assert_eq!(transport.queue_len("q"), 0);
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_counted() {
        let transport = MemoryTransport::new();
        transport.set_faults(Faults {
            refuse_connect: true,
            ..Default::default()
        });

        let err = transport.connect("amqp://memory").await.unwrap_err();
        assert!(matches!(err, QueueError::Connection(_)));
        assert_eq!(transport.connections_opened(), 0);
    }
}
