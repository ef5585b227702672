use std::sync::Arc;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use appointment_cell::{appointment_routes, BookingOrchestrator};
use catalog_cell::{catalog_routes, CatalogRepository, CatalogState};
use shared_athena::AthenaClient;
use shared_config::AppConfig;

pub fn create_router(
    config: &AppConfig,
    athena: Arc<AthenaClient>,
    catalog: Arc<dyn CatalogRepository>,
) -> Router {
    let catalog_state = Arc::new(CatalogState {
        catalog: catalog.clone(),
        athena: athena.clone(),
    });
    let orchestrator = Arc::new(BookingOrchestrator::new(catalog, athena));
    let environment = config.app_env.clone();

    Router::new()
        .route("/health", get(move || health(environment.clone())))
        .nest(
            "/api",
            catalog_routes(catalog_state).merge(appointment_routes(orchestrator)),
        )
}

async fn health(environment: String) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": environment
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use catalog_cell::InMemoryCatalogRepository;
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = TestConfig::default().to_app_config();
        create_router(
            &config,
            Arc::new(AthenaClient::new(&config)),
            Arc::new(InMemoryCatalogRepository::with_default_catalog()),
        )
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["environment"], "test");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_cells_are_mounted_under_api() {
        let (status, json) = get_json("/api/appointment-types").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 6);

        let (status, _) = get_json("/api/admin/providers").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get_json("/api/appointments/available?providerId=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
