// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use catalog_cell::{CatalogRepository, IdentityMapper};
use shared_athena::{id_field, AthenaClient, GatewayError};

use crate::models::{
    format_date, BookingOutcome, BookingRequest, PatientDemographics, SchedulingError, SlotQuery,
};
use crate::services::slot_time;

/// Ids resolved against the catalog for one request.
struct AthenaIds {
    provider_id: String,
    appointment_type_id: String,
    service_name: String,
}

/// Slot lookup and the find-or-create-patient-then-book workflow against
/// Athena.
pub struct BookingOrchestrator {
    catalog: Arc<dyn CatalogRepository>,
    athena: Arc<AthenaClient>,
}

impl BookingOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogRepository>, athena: Arc<AthenaClient>) -> Self {
        Self { catalog, athena }
    }

    pub async fn get_available_slots(&self, query: &SlotQuery) -> Result<Vec<String>, SchedulingError> {
        let ids = self
            .resolve_ids(query.provider_id, query.appointment_type_id)
            .await?;
        let date = format_date(query.date);

        info!(
            "Fetching available appointments for provider {} on {}",
            ids.provider_id, date
        );

        let response = self
            .athena
            .get(
                &self.athena.practice_endpoint("appointments/open"),
                &[
                    ("departmentid", self.athena.department_id().to_string()),
                    ("providerid", ids.provider_id),
                    ("appointmenttypeid", ids.appointment_type_id),
                    ("startdate", date.clone()),
                    ("enddate", date),
                    ("showfrozenslots", "false".to_string()),
                    ("ignoreschedulablepermission", "false".to_string()),
                ],
            )
            .await?;

        let slots: Vec<String> = response
            .get("appointments")
            .and_then(Value::as_array)
            .map(|appointments| appointments.iter().filter_map(display_start_time).collect())
            .unwrap_or_default();

        info!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// Validation problems come back as `Err` before anything is sent to
    /// Athena. Every network outcome is reported through `BookingOutcome`.
    pub async fn book_appointment(
        &self,
        request: BookingRequest,
    ) -> Result<BookingOutcome, SchedulingError> {
        let patient = &request.patient;
        patient.validate()?;

        let ids = self
            .resolve_ids(request.provider_id, request.appointment_type_id)
            .await?;
        let appointment_time = slot_time::to_wire(&request.time)
            .map_err(|_| SchedulingError::Validation("Invalid time format".to_string()))?;

        info!(
            "Booking appointment for {} {}",
            patient.first_name, patient.last_name
        );

        let patient_id = match self.find_or_create_patient(patient).await {
            Ok(id) => id,
            Err(cause) => {
                if cause.is_timeout() {
                    warn!("Patient lookup timed out, a patient record may exist upstream: {}", cause);
                } else {
                    error!("Error handling patient: {}", cause);
                }
                return Ok(BookingOutcome::Failed { cause });
            }
        };

        let reason = patient
            .reason()
            .map(str::to_string)
            .unwrap_or_else(|| ids.service_name.clone());

        let booking = self
            .athena
            .post_form(
                &self.athena.practice_endpoint("appointments"),
                &[
                    ("appointmenttypeid", ids.appointment_type_id),
                    ("departmentid", self.athena.department_id().to_string()),
                    ("patientid", patient_id.clone()),
                    ("providerid", ids.provider_id),
                    ("appointmentdate", format_date(request.date)),
                    ("appointmenttime", appointment_time),
                    ("reasonforappt", reason),
                ],
            )
            .await
            .and_then(|response| {
                first_id(&response, "appointmentid").ok_or_else(|| {
                    GatewayError::upstream(None, "Booking failed - no appointment ID returned")
                })
            });

        match booking {
            Ok(appointment_id) => {
                info!("Appointment booked successfully: {}", appointment_id);
                Ok(BookingOutcome::Booked {
                    appointment_id,
                    patient_id,
                })
            }
            Err(cause) => {
                error!(
                    "Appointment booking failed after patient {} was resolved: {}",
                    patient_id, cause
                );
                Ok(BookingOutcome::PartialFailure { patient_id, cause })
            }
        }
    }

    async fn resolve_ids(
        &self,
        provider_id: u32,
        appointment_type_id: u32,
    ) -> Result<AthenaIds, SchedulingError> {
        let snapshot = self.catalog.snapshot().await;
        let mapper = IdentityMapper::new(&snapshot);

        let service = mapper.bookable_service_type(appointment_type_id)?;
        let provider = mapper.external_provider(provider_id)?;
        mapper.ensure_offered(appointment_type_id, provider_id)?;

        Ok(AthenaIds {
            provider_id: provider.to_string(),
            appointment_type_id: service.athena_appointment_type_id.clone(),
            service_name: service.name.clone(),
        })
    }

    /// Exact first name, last name and date of birth match, else a new record.
    async fn find_or_create_patient(
        &self,
        patient: &PatientDemographics,
    ) -> Result<String, GatewayError> {
        let endpoint = self.athena.practice_endpoint("patients");
        let first_name = patient.first_name.trim().to_string();
        let last_name = patient.last_name.trim().to_string();
        let dob = patient.date_of_birth.trim().to_string();

        debug!("Searching for existing patient");
        let search = self
            .athena
            .get(
                &endpoint,
                &[
                    ("firstname", first_name.clone()),
                    ("lastname", last_name.clone()),
                    ("dob", dob.clone()),
                ],
            )
            .await?;

        let first_match = search
            .get("patients")
            .and_then(Value::as_array)
            .and_then(|patients| patients.first());

        if let Some(matched) = first_match {
            let patient_id = id_field(matched, "patientid").ok_or_else(|| {
                GatewayError::upstream(None, "Patient match returned without patientid")
            })?;
            info!("Found existing patient: {}", patient_id);
            return Ok(patient_id);
        }

        debug!("Creating new patient");
        let created = self
            .athena
            .post_form(
                &endpoint,
                &[
                    ("firstname", first_name),
                    ("lastname", last_name),
                    ("dob", dob),
                    ("email", patient.email.trim().to_string()),
                    ("mobilephone", patient.mobile_phone()),
                    ("departmentid", self.athena.department_id().to_string()),
                    ("sex", "U".to_string()),
                    ("countrycode3166", "US".to_string()),
                    ("zip", "00000".to_string()),
                ],
            )
            .await?;

        let patient_id = first_id(&created, "patientid").ok_or_else(|| {
            GatewayError::upstream(None, "Failed to create patient - no patient ID returned")
        })?;

        info!("Created new patient: {}", patient_id);
        Ok(patient_id)
    }
}

/// Athena answers writes with a one-element array.
fn first_id(response: &Value, key: &str) -> Option<String> {
    response
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| id_field(item, key))
}

fn display_start_time(slot: &Value) -> Option<String> {
    let start = slot.get("starttime").and_then(Value::as_str)?;
    match slot_time::to_display(start) {
        Ok(display) => Some(display),
        Err(e) => {
            warn!("Skipping open slot with unusable start time: {}", e);
            None
        }
    }
}
