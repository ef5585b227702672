use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;

pub const TEST_PRACTICE_ID: &str = "195900";
pub const TEST_DEPARTMENT_ID: &str = "1";

pub struct TestConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub practice_id: String,
    pub department_id: String,
    pub request_timeout: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9".to_string(),
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            practice_id: TEST_PRACTICE_ID.to_string(),
            department_id: TEST_DEPARTMENT_ID.to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            athena_base_url: self.base_url.clone(),
            athena_client_id: self.client_id.clone(),
            athena_client_secret: self.client_secret.clone(),
            athena_practice_id: self.practice_id.clone(),
            athena_department_id: self.department_id.clone(),
            athena_environment: "preview1".to_string(),
            athena_request_timeout: self.request_timeout,
            athena_token_timeout: Duration::from_secs(5),
            athena_token_safety_margin: Duration::from_secs(60),
            port: 0,
            frontend_url: None,
            app_env: "test".to_string(),
        }
    }
}

/// Mounts a token endpoint that always grants `token`.
pub async fn mount_token_endpoint(server: &MockServer, token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

pub fn practice_path(suffix: &str) -> String {
    format!("/v1/{}/{}", TEST_PRACTICE_ID, suffix)
}

pub struct MockAthenaResponses;

impl MockAthenaResponses {
    pub fn open_slots(start_times: &[&str]) -> Value {
        let appointments: Vec<Value> = start_times
            .iter()
            .enumerate()
            .map(|(i, time)| {
                json!({
                    "appointmentid": (1000 + i).to_string(),
                    "starttime": time,
                    "date": "06/10/2025",
                    "duration": "30",
                    "appointmenttypeid": "2",
                    "providerid": "1",
                    "departmentid": TEST_DEPARTMENT_ID
                })
            })
            .collect();

        json!({
            "totalcount": appointments.len(),
            "appointments": appointments
        })
    }

    pub fn patient_search(patient_ids: &[&str]) -> Value {
        let patients: Vec<Value> = patient_ids
            .iter()
            .map(|id| {
                json!({
                    "patientid": id,
                    "firstname": "Jane",
                    "lastname": "Doe",
                    "dob": "1990-01-01"
                })
            })
            .collect();

        json!({
            "totalcount": patients.len(),
            "patients": patients
        })
    }

    pub fn created_patient(patient_id: &str) -> Value {
        json!([{ "patientid": patient_id }])
    }

    pub fn booked_appointment(appointment_id: &str) -> Value {
        json!([{ "appointmentid": appointment_id, "appointmentstatus": "f" }])
    }

    pub fn providers(entries: &[(&str, &str, &str, Option<&str>)]) -> Value {
        let providers: Vec<Value> = entries
            .iter()
            .map(|(id, first, last, specialty)| {
                json!({
                    "providerid": id,
                    "firstname": first,
                    "lastname": last,
                    "specialty": specialty
                })
            })
            .collect();

        json!({
            "totalcount": providers.len(),
            "providers": providers
        })
    }
}
