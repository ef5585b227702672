// libs/catalog-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_athena::AthenaClient;

use crate::handlers::*;
use crate::repository::CatalogRepository;

pub struct CatalogState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub athena: Arc<AthenaClient>,
}

/// Catalog routes, mounted under `/api`.
pub fn catalog_routes(state: Arc<CatalogState>) -> Router {
    let public_routes = Router::new()
        .route("/appointment-types", get(list_appointment_types));

    let admin_routes = Router::new()
        .route(
            "/appointment-types",
            get(list_all_appointment_types).post(create_appointment_type),
        )
        .route(
            "/appointment-types/{id}",
            put(update_appointment_type).delete(deactivate_appointment_type),
        )
        .route("/providers", get(list_providers))
        .route("/providers/{id}", put(update_provider))
        .route("/test-athena", get(test_athena_connection))
        .route("/sync-providers", post(sync_providers))
        .route("/athena/appointment-types", get(list_athena_appointment_types));

    Router::new()
        .merge(public_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
}
