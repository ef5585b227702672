// libs/appointment-cell/src/lib.rs
//! # Appointment Cell
//!
//! Patient self-scheduling against athenahealth: open slot lookup and the
//! two-step booking workflow (find or create the patient, then book).
//!
//! Booking is not atomic. When the patient step succeeds and the booking
//! step fails the caller gets `BookingOutcome::PartialFailure` carrying the
//! Athena patient id, so the orphaned record can be reconciled.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookingOutcome, BookingRequest, PatientDemographics, SchedulingError, SlotQuery};
pub use router::appointment_routes;
pub use services::slot_time::{to_display, to_wire};
pub use services::{BookingOrchestrator, FormatError};
