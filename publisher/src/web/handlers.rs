//! HTTP endpoint handlers.
//!
//! Handlers never surface publish errors: the body is always a
//! `RegistrationResult`, and the specific failure is only logged.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use crate::queue::{AmqpTransport, TicketMessage, Transport};
use crate::registration::{
    featured_event, EventListing, RegistrationForm, RegistrationResult, RegistrationService,
};
use crate::Config;

/// Shared application state.
pub struct AppState<T: Transport = AmqpTransport> {
    pub config: Arc<Config>,
    pub registrations: RegistrationService<T>,
}

impl<T: Transport> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            registrations: self.registrations.clone(),
        }
    }
}

impl<T: Transport> AppState<T> {
    pub fn new(config: Config, registrations: RegistrationService<T>) -> Self {
        Self {
            config: Arc::new(config),
            registrations,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the publisher currently holds a broker session
    pub broker_connected: bool,
}

/// Health check endpoint.
pub async fn health<T: Transport>(State(state): State<AppState<T>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        broker_connected: state.registrations.publisher().is_connected().await,
    })
}

// =============================================================================
// Event
// =============================================================================

/// Details of the event open for registration.
pub async fn event() -> Json<EventListing> {
    Json(featured_event())
}

// =============================================================================
// Registrations
// =============================================================================

fn respond(result: RegistrationResult) -> (StatusCode, Json<RegistrationResult>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(result))
}

/// Register an attendee: publishes the email and SMS notifications together.
pub async fn register<T: Transport>(
    State(state): State<AppState<T>>,
    Json(form): Json<RegistrationForm>,
) -> (StatusCode, Json<RegistrationResult>) {
    let result = state.registrations.register(form).await;

    info!(success = result.success, "registration_completed");

    respond(result)
}

/// Publish a single, fully formed ticket message.
pub async fn send_registration<T: Transport>(
    State(state): State<AppState<T>>,
    Json(message): Json<TicketMessage>,
) -> (StatusCode, Json<RegistrationResult>) {
    info!(
        kind = message.kind.as_deref().unwrap_or("none"),
        event = %message.event.name,
        "registration_message_received"
    );

    respond(state.registrations.send(&message).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublisherConfig;
    use crate::queue::types::sample_message;
    use crate::queue::{Faults, MemoryTransport, Publisher, User};
    use crate::util::RetryPolicy;

    fn state() -> (AppState<MemoryTransport>, MemoryTransport) {
        let transport = MemoryTransport::new();
        let publisher = Publisher::with_transport(
            PublisherConfig::new("amqp://localhost:5672/%2f"),
            transport.clone(),
        );
        let registrations = RegistrationService::new(publisher, RetryPolicy::none(), "55");
        (AppState::new(Config::from_env(), registrations), transport)
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            event: None,
            user: User {
                name: "Ana".to_string(),
                email: "ana@x.com".to_string(),
                phone: "11999999999".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_health_reports_connection_state() {
        let (state, _) = state();
        let Json(before) = health(State(state.clone())).await;
        assert_eq!(before.status, "ok");
        assert!(!before.broker_connected);

        state.registrations.publisher().ensure_connected().await.unwrap();
        let Json(after) = health(State(state)).await;
        assert!(after.broker_connected);
    }

    #[tokio::test]
    async fn test_register_success() {
        let (state, transport) = state();
        let (status, Json(result)) = register(State(state), Json(form())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(result.success);
        assert_eq!(transport.queue_len("tickets-queue"), 2);
    }

    #[tokio::test]
    async fn test_register_failure_is_generic() {
        let (state, transport) = state();
        transport.set_faults(Faults {
            fail_send: true,
            ..Default::default()
        });

        let (status, Json(result)) = register(State(state), Json(form())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(result, RegistrationResult::failed());
    }

    #[tokio::test]
    async fn test_send_registration() {
        let (state, transport) = state();
        let (status, Json(result)) = send_registration(State(state), Json(sample_message())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(result.success);
        assert_eq!(transport.queue_len("tickets-queue"), 1);
    }

    #[tokio::test]
    async fn test_event_listing() {
        let Json(listing) = event().await;
        assert_eq!(listing.title, "Tech Conference 2024");
        assert_eq!(listing.speakers.len(), 4);
    }
}
