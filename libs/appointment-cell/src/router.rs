// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::BookingOrchestrator;

/// Scheduling routes, mounted under `/api`.
pub fn appointment_routes(orchestrator: Arc<BookingOrchestrator>) -> Router {
    Router::new()
        .route("/appointments/available", get(handlers::get_available_appointments))
        .route("/appointments/book", post(handlers::book_appointment))
        .with_state(orchestrator)
}
