//! Web server module for event registration.
//!
//! This module provides a thin web server that:
//! - Serves the event being registered for
//! - Accepts registrations and publishes their notifications
//! - Reports a uniform success/failure result to the caller

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::queue::Transport;

pub use handlers::{event, health, register, send_registration, AppState, HealthResponse};

/// Build the application router.
pub fn router<T: Transport>(state: AppState<T>) -> Router {
    Router::new()
        .route("/health", get(health::<T>))
        .route("/event", get(event))
        .route("/registrations", post(register::<T>))
        .route("/registrations/send", post(send_registration::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
