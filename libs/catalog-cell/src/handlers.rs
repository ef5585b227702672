// libs/catalog-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use shared_athena::GatewayError;
use shared_models::error::AppError;

use crate::models::{
    AppointmentTypeView, CatalogError, NewServiceType, Provider, ProviderUpdate,
    ServiceCatalogEntry, ServiceTypeUpdate, SyncError,
};
use crate::router::CatalogState;
use crate::services::AthenaAdminService;

fn catalog_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        CatalogError::Validation(message) => AppError::ValidationError(message),
        CatalogError::Conflict(message) => AppError::Conflict(message),
    }
}

fn sync_error(err: SyncError, user_message: &str) -> AppError {
    error!("{}: {}", user_message, err);
    match err {
        SyncError::Catalog(e) => catalog_error(e),
        SyncError::Gateway(GatewayError::Auth { message }) => {
            AppError::Internal(format!("{}: Athena authentication failed: {}", user_message, message))
        }
        SyncError::Gateway(e) => AppError::ExternalService(format!("{}: {}", user_message, e)),
        SyncError::InvalidResponse(message) => {
            AppError::ExternalService(format!("{}: {}", user_message, message))
        }
    }
}

// ==============================================================================
// PUBLIC CATALOG HANDLERS
// ==============================================================================

/// Active appointment types with their providers resolved, for the booking UI.
#[axum::debug_handler]
pub async fn list_appointment_types(
    State(state): State<Arc<CatalogState>>,
) -> Json<Vec<AppointmentTypeView>> {
    let snapshot = state.catalog.snapshot().await;
    let active: Vec<AppointmentTypeView> = snapshot
        .active_service_types()
        .map(|entry| snapshot.resolve(entry))
        .collect();

    info!("Returning {} active appointment types", active.len());
    Json(active)
}

// ==============================================================================
// ADMIN CATALOG HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_all_appointment_types(
    State(state): State<Arc<CatalogState>>,
) -> Json<Vec<ServiceCatalogEntry>> {
    Json(state.catalog.snapshot().await.service_types.clone())
}

#[axum::debug_handler]
pub async fn create_appointment_type(
    State(state): State<Arc<CatalogState>>,
    Json(request): Json<NewServiceType>,
) -> Result<Json<ServiceCatalogEntry>, AppError> {
    let entry = state
        .catalog
        .create_service_type(request)
        .await
        .map_err(catalog_error)?;

    Ok(Json(entry))
}

#[axum::debug_handler]
pub async fn update_appointment_type(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<u32>,
    Json(request): Json<ServiceTypeUpdate>,
) -> Result<Json<ServiceCatalogEntry>, AppError> {
    let entry = state
        .catalog
        .update_service_type(id, request)
        .await
        .map_err(catalog_error)?;

    Ok(Json(entry))
}

#[axum::debug_handler]
pub async fn deactivate_appointment_type(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<u32>,
) -> Result<Json<Value>, AppError> {
    state
        .catalog
        .deactivate_service_type(id)
        .await
        .map_err(catalog_error)?;

    Ok(Json(json!({ "message": "Appointment type deactivated" })))
}

#[axum::debug_handler]
pub async fn list_providers(State(state): State<Arc<CatalogState>>) -> Json<Vec<Provider>> {
    Json(state.catalog.snapshot().await.providers.clone())
}

#[axum::debug_handler]
pub async fn update_provider(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<u32>,
    Json(request): Json<ProviderUpdate>,
) -> Result<Json<Provider>, AppError> {
    let provider = state
        .catalog
        .update_provider(id, request)
        .await
        .map_err(catalog_error)?;

    Ok(Json(provider))
}

// ==============================================================================
// ATHENA ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn test_athena_connection(
    State(state): State<Arc<CatalogState>>,
) -> Result<Json<Value>, AppError> {
    let service = AthenaAdminService::new(state.athena.clone(), state.catalog.clone());

    let report = service
        .test_connection()
        .await
        .map_err(|e| sync_error(e, "Failed to connect to Athena API"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Successfully connected to Athena API",
        "practiceId": report.practice_id,
        "environment": report.environment,
        "providersCount": report.providers_count,
        "practiceInfo": report.practice_info
    })))
}

#[axum::debug_handler]
pub async fn sync_providers(
    State(state): State<Arc<CatalogState>>,
) -> Result<Json<Value>, AppError> {
    let service = AthenaAdminService::new(state.athena.clone(), state.catalog.clone());

    let report = service
        .sync_providers()
        .await
        .map_err(|e| sync_error(e, "Failed to sync providers from Athena"))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Synced {} providers from Athena", report.received),
        "syncedCount": report.synced_count,
        "addedCount": report.added_count,
        "totalProviders": report.total_providers
    })))
}

#[axum::debug_handler]
pub async fn list_athena_appointment_types(
    State(state): State<Arc<CatalogState>>,
) -> Result<Json<Value>, AppError> {
    let service = AthenaAdminService::new(state.athena.clone(), state.catalog.clone());

    let types = service
        .list_athena_appointment_types()
        .await
        .map_err(|e| sync_error(e, "Failed to fetch appointment types from Athena"))?;

    Ok(Json(json!({
        "success": true,
        "appointmentTypes": types
    })))
}
