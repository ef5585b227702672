// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};
use uuid::Uuid;

use shared_athena::GatewayError;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityParams, BookingForm, BookingOutcome, BookingRequest, SchedulingError, SlotQuery,
};
use crate::services::BookingOrchestrator;

const SLOTS_UNAVAILABLE: &str = "Failed to fetch available appointments. Please try again later.";
const PATIENT_FAILED: &str = "Failed to create or find patient record. Please try again.";
const BOOKING_FAILED: &str =
    "Failed to book appointment. The time slot may no longer be available.";
const OUTCOME_UNKNOWN: &str =
    "The scheduling system did not respond in time. Please contact the clinic before trying again.";

fn scheduling_error(err: SchedulingError, gateway_message: &str) -> AppError {
    match err {
        SchedulingError::Validation(message) => AppError::ValidationError(message),
        SchedulingError::NotFound(message) => AppError::NotFound(message),
        SchedulingError::Gateway(cause) => gateway_error(cause, gateway_message),
    }
}

fn gateway_error(cause: GatewayError, user_message: &str) -> AppError {
    error!("{}: {}", user_message, cause);
    match cause {
        GatewayError::Auth { .. } => AppError::Internal(user_message.to_string()),
        GatewayError::UpstreamTimeout { .. } => AppError::ExternalService(OUTCOME_UNKNOWN.to_string()),
        GatewayError::Upstream { .. } => AppError::ExternalService(user_message.to_string()),
    }
}

#[axum::debug_handler]
pub async fn get_available_appointments(
    State(orchestrator): State<Arc<BookingOrchestrator>>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Value>, AppError> {
    let query = SlotQuery::try_from(params).map_err(|e| scheduling_error(e, SLOTS_UNAVAILABLE))?;

    let slots = orchestrator
        .get_available_slots(&query)
        .await
        .map_err(|e| scheduling_error(e, SLOTS_UNAVAILABLE))?;

    Ok(Json(json!({ "availableSlots": slots })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(orchestrator): State<Arc<BookingOrchestrator>>,
    body: Result<Json<BookingForm>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(form) = body.map_err(|rejection| {
        warn!("Rejected booking body: {}", rejection.body_text());
        AppError::BadRequest("Invalid booking request body".to_string())
    })?;
    let request = BookingRequest::try_from(form).map_err(|e| scheduling_error(e, BOOKING_FAILED))?;

    let outcome = orchestrator
        .book_appointment(request)
        .await
        .map_err(|e| scheduling_error(e, BOOKING_FAILED))?;

    match outcome {
        BookingOutcome::Booked {
            appointment_id,
            patient_id,
        } => Ok(Json(json!({
            "success": true,
            "appointmentId": appointment_id,
            "patientId": patient_id,
            "message": "Appointment booked successfully"
        }))),
        BookingOutcome::PartialFailure { patient_id, cause } => {
            let incident_id = Uuid::new_v4().to_string();
            error!(
                "Booking incident {}: patient {} has no appointment: {}",
                incident_id, patient_id, cause
            );
            let message = if cause.is_timeout() {
                warn!("Booking incident {} may have completed upstream", incident_id);
                OUTCOME_UNKNOWN
            } else {
                BOOKING_FAILED
            };
            Err(AppError::PartialFailure {
                message: message.to_string(),
                patient_id,
                incident_id,
            })
        }
        BookingOutcome::Failed { cause } => Err(gateway_error(cause, PATIENT_FAILED)),
    }
}
