//! Notification fan-out for registrations.
//!
//! Each notification is published by its own task; the registration succeeds
//! only if every task does.

use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::event::featured_event;
use super::form::{build_notifications, RegistrationForm};
use super::RegistrationResult;
use crate::queue::publisher::log_publish_failure;
use crate::queue::{AmqpTransport, Publisher, QueueError, TicketMessage, Transport};
use crate::util::RetryPolicy;

/// Publishes registration notifications through a shared publisher.
pub struct RegistrationService<T: Transport = AmqpTransport> {
    publisher: Publisher<T>,
    retry: RetryPolicy,
    country_code: String,
}

impl<T: Transport> Clone for RegistrationService<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
            retry: self.retry,
            country_code: self.country_code.clone(),
        }
    }
}

impl<T: Transport> RegistrationService<T> {
    pub fn new(
        publisher: Publisher<T>,
        retry: RetryPolicy,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            retry,
            country_code: country_code.into(),
        }
    }

    pub fn publisher(&self) -> &Publisher<T> {
        &self.publisher
    }

    /// Publish one message and report a uniform result.
    pub async fn send(&self, message: &TicketMessage) -> RegistrationResult {
        match publish_with_retry(&self.publisher, message, self.retry).await {
            Ok(()) => RegistrationResult::sent(),
            Err(e) => {
                log_publish_failure(&e, message.kind.as_deref());
                RegistrationResult::failed()
            }
        }
    }

    /// Build and dispatch the email and SMS notifications for a form.
    pub async fn register(&self, form: RegistrationForm) -> RegistrationResult {
        let event = form.event.unwrap_or_else(|| featured_event().to_event());

        info!(
            event = %event.name,
            has_email = !form.user.email.is_empty(),
            has_phone = !form.user.phone.is_empty(),
            "registration_received"
        );

        let messages = build_notifications(event, form.user, &self.country_code, Utc::now());
        self.dispatch(messages).await
    }

    /// Publish every message concurrently and require all to succeed.
    pub async fn dispatch(&self, messages: Vec<TicketMessage>) -> RegistrationResult {
        let mut tasks = JoinSet::new();

        for message in messages {
            let publisher = self.publisher.clone();
            let retry = self.retry;
            tasks.spawn(async move {
                let outcome = publish_with_retry(&publisher, &message, retry).await;
                (message.kind, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => outcomes.push(RegistrationResult::sent()),
                Ok((kind, Err(e))) => {
                    log_publish_failure(&e, kind.as_deref());
                    outcomes.push(RegistrationResult::failed());
                }
                Err(e) => {
                    error!(error = %e, "notification_task_failed");
                    outcomes.push(RegistrationResult::failed());
                }
            }
        }

        let delivered = outcomes.iter().filter(|r| r.success).count();
        info!(
            delivered = delivered,
            failed = outcomes.len() - delivered,
            "registration_dispatched"
        );

        RegistrationResult::all(outcomes)
    }
}

/// Publish with the caller's retry policy.
///
/// Serialization errors are returned immediately; every other failure is
/// retried until the policy's attempts run out.
pub async fn publish_with_retry<T: Transport>(
    publisher: &Publisher<T>,
    message: &TicketMessage,
    policy: RetryPolicy,
) -> Result<(), QueueError> {
    let mut attempt = 1;

    loop {
        match publisher.publish(message).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < policy.max_attempts && e.is_retryable() => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    error_kind = %e.kind(),
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "rabbitmq_publish_retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
