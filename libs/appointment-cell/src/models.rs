// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use catalog_cell::CatalogError;
use shared_athena::GatewayError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("EMAIL pattern is valid")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==============================================================================
// SLOT LOOKUP
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub provider_id: u32,
    pub date: NaiveDate,
    pub appointment_type_id: u32,
}

/// Raw query string of `GET /appointments/available`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub provider_id: Option<String>,
    pub date: Option<String>,
    pub appointment_type_id: Option<String>,
}

impl TryFrom<AvailabilityParams> for SlotQuery {
    type Error = SchedulingError;

    fn try_from(params: AvailabilityParams) -> Result<Self, Self::Error> {
        let (Some(provider_id), Some(date), Some(appointment_type_id)) = (
            non_blank(params.provider_id),
            non_blank(params.date),
            non_blank(params.appointment_type_id),
        ) else {
            return Err(SchedulingError::Validation(
                "Missing required parameters: providerId, date, and appointmentTypeId are required"
                    .to_string(),
            ));
        };

        Ok(SlotQuery {
            provider_id: parse_id("providerId", &provider_id)?,
            date: parse_date("date", &date)?,
            appointment_type_id: parse_id("appointmentTypeId", &appointment_type_id)?,
        })
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDemographics {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub reason: Option<String>,
}

impl PatientDemographics {
    pub fn validate(&self) -> Result<(), SchedulingError> {
        let missing: Vec<&str> = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("dateOfBirth", &self.date_of_birth),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(SchedulingError::Validation(format!(
                "Missing required patient information: {}",
                missing.join(", ")
            )));
        }

        if !EMAIL.is_match(self.email.trim()) {
            return Err(SchedulingError::Validation("Invalid email address".to_string()));
        }

        if self.mobile_phone().is_empty() {
            return Err(SchedulingError::Validation(
                "Phone number must contain digits".to_string(),
            ));
        }

        parse_date("dateOfBirth", &self.date_of_birth)?;

        Ok(())
    }

    /// Phone number with everything but digits stripped.
    pub fn mobile_phone(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub provider_id: u32,
    pub date: NaiveDate,
    /// Display time as chosen by the patient, e.g. `2:30 PM`.
    pub time: String,
    pub appointment_type_id: u32,
    pub patient: PatientDemographics,
}

/// Ids arrive as numbers from the booking UI and as strings from older
/// clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn parse(&self, field: &str) -> Result<u32, SchedulingError> {
        match self {
            IdValue::Number(n) => u32::try_from(*n)
                .map_err(|_| SchedulingError::Validation(format!("Invalid {}", field))),
            IdValue::Text(s) => parse_id(field, s),
        }
    }
}

/// Body of `POST /appointments/book` before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    pub provider_id: Option<IdValue>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub appointment_type_id: Option<IdValue>,
    pub patient: Option<PatientDemographics>,
}

impl TryFrom<BookingForm> for BookingRequest {
    type Error = SchedulingError;

    fn try_from(form: BookingForm) -> Result<Self, Self::Error> {
        let (Some(provider_id), Some(date), Some(time), Some(appointment_type_id), Some(patient)) = (
            form.provider_id,
            non_blank(form.date),
            non_blank(form.time),
            form.appointment_type_id,
            form.patient,
        ) else {
            return Err(SchedulingError::Validation(
                "Missing required booking information".to_string(),
            ));
        };

        Ok(BookingRequest {
            provider_id: provider_id.parse("providerId")?,
            date: parse_date("date", &date)?,
            time,
            appointment_type_id: appointment_type_id.parse("appointmentTypeId")?,
            patient,
        })
    }
}

/// Result of the two-step booking workflow. `PartialFailure` means a patient
/// record exists upstream with no appointment attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked {
        appointment_id: String,
        patient_id: String,
    },
    PartialFailure {
        patient_id: String,
        cause: GatewayError,
    },
    Failed {
        cause: GatewayError,
    },
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<CatalogError> for SchedulingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => SchedulingError::NotFound(err.to_string()),
            CatalogError::Validation(message) | CatalogError::Conflict(message) => {
                SchedulingError::Validation(message)
            }
        }
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_id(field: &str, value: &str) -> Result<u32, SchedulingError> {
    value
        .trim()
        .parse()
        .map_err(|_| SchedulingError::Validation(format!("Invalid {}", field)))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        SchedulingError::Validation(format!("Invalid {}: expected YYYY-MM-DD", field))
    })
}
