use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{appointment_routes, BookingOrchestrator};
use catalog_cell::InMemoryCatalogRepository;
use shared_athena::AthenaClient;
use shared_utils::test_utils::{
    mount_token_endpoint, practice_path, MockAthenaResponses, TestConfig,
};

fn app(server: &MockServer) -> Router {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    appointment_routes(Arc::new(BookingOrchestrator::new(
        Arc::new(InMemoryCatalogRepository::with_default_catalog()),
        Arc::new(AthenaClient::new(&config)),
    )))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn book(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/appointments/book")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn booking_body() -> Value {
    json!({
        "providerId": 1,
        "date": "2025-06-10",
        "time": "2:30 PM",
        "appointmentTypeId": 1,
        "patient": {
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@x.com",
            "phone": "555-123-4567",
            "dateOfBirth": "1990-01-01"
        }
    })
}

async fn mount_existing_patient(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(practice_path("patients")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockAthenaResponses::patient_search(&["7777"])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_available_requires_all_parameters() {
    let server = MockServer::start().await;
    let (status, json) = send(
        app(&server),
        get("/appointments/available?providerId=1&date=2025-06-10"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Missing required parameters: providerId, date, and appointmentTypeId are required"
    );
}

#[tokio::test]
async fn test_available_unknown_appointment_type_is_404() {
    let server = MockServer::start().await;
    let (status, json) = send(
        app(&server),
        get("/appointments/available?providerId=1&date=2025-06-10&appointmentTypeId=42"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Appointment type not found");
}

#[tokio::test]
async fn test_available_returns_display_slots() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok", 3600).await;
    Mock::given(method("GET"))
        .and(path(practice_path("appointments/open")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockAthenaResponses::open_slots(&["10:00", "15:30"])),
        )
        .mount(&server)
        .await;

    let (status, json) = send(
        app(&server),
        get("/appointments/available?providerId=1&date=2025-06-10&appointmentTypeId=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "availableSlots": ["10:00 AM", "3:30 PM"] }));
}

#[tokio::test]
async fn test_available_upstream_failure_is_502() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok", 3600).await;
    Mock::given(method("GET"))
        .and(path(practice_path("appointments/open")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, json) = send(
        app(&server),
        get("/appointments/available?providerId=1&date=2025-06-10&appointmentTypeId=1"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        json["error"],
        "Failed to fetch available appointments. Please try again later."
    );
}

#[tokio::test]
async fn test_book_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok", 3600).await;
    mount_existing_patient(&server).await;
    Mock::given(method("POST"))
        .and(path(practice_path("appointments")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockAthenaResponses::booked_appointment("4242")),
        )
        .mount(&server)
        .await;

    let (status, json) = send(app(&server), book(booking_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "success": true,
            "appointmentId": "4242",
            "patientId": "7777",
            "message": "Appointment booked successfully"
        })
    );
}

#[tokio::test]
async fn test_book_partial_failure_reports_patient_and_incident() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok", 3600).await;
    mount_existing_patient(&server).await;
    Mock::given(method("POST"))
        .and(path(practice_path("appointments")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "error": "Slot taken" })))
        .mount(&server)
        .await;

    let (status, json) = send(app(&server), book(booking_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json["error"],
        "Failed to book appointment. The time slot may no longer be available."
    );
    assert_eq!(json["patientId"], "7777");
    assert!(uuid::Uuid::parse_str(json["incidentId"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_book_patient_failure_is_502() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "tok", 3600).await;
    Mock::given(method("GET"))
        .and(path(practice_path("patients")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, json) = send(app(&server), book(booking_body())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        json["error"],
        "Failed to create or find patient record. Please try again."
    );
}

#[tokio::test]
async fn test_book_missing_information_is_400() {
    let server = MockServer::start().await;
    let mut body = booking_body();
    body.as_object_mut().unwrap().remove("time");

    let (status, json) = send(app(&server), book(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required booking information");
}

#[tokio::test]
async fn test_book_invalid_time_is_400() {
    let server = MockServer::start().await;
    let mut body = booking_body();
    body["time"] = json!("half past two");

    let (status, json) = send(app(&server), book(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid time format");
}

#[tokio::test]
async fn test_book_wrongly_typed_field_is_json_400() {
    let server = MockServer::start().await;
    let body = json!({ "providerId": 1, "patient": { "phone": 5551234567u64 } });

    let (status, json) = send(app(&server), book(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid booking request body");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_book_malformed_json_is_json_400() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/appointments/book")
        .header("content-type", "application/json")
        .body(Body::from("{\"providerId\": 1,"))
        .unwrap();

    let (status, json) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid booking request body");
}
