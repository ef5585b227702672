// libs/catalog-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_athena::GatewayError;

// ==============================================================================
// CATALOG ENTITIES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: u32,
    pub name: String,
    pub specialty: String,
    pub athena_provider_id: String,
}

/// A bookable service. Never removed, only deactivated, so appointments
/// that reference it stay resolvable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalogEntry {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub athena_appointment_type_id: String,
    pub providers: Vec<u32>,
    pub active: bool,
}

/// Public shape of an appointment type with its providers resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentTypeView {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub athena_appointment_type_id: String,
    pub providers: Vec<Provider>,
    pub active: bool,
}

/// Immutable view of the whole catalog, shared by a request for its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub providers: Vec<Provider>,
    pub service_types: Vec<ServiceCatalogEntry>,
}

impl CatalogSnapshot {
    pub fn find_provider(&self, id: u32) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn find_provider_by_external(&self, athena_provider_id: &str) -> Option<&Provider> {
        self.providers
            .iter()
            .find(|p| p.athena_provider_id == athena_provider_id)
    }

    pub fn find_service_type(&self, id: u32) -> Option<&ServiceCatalogEntry> {
        self.service_types.iter().find(|s| s.id == id)
    }

    pub fn active_service_types(&self) -> impl Iterator<Item = &ServiceCatalogEntry> {
        self.service_types.iter().filter(|s| s.active)
    }

    pub fn resolve(&self, entry: &ServiceCatalogEntry) -> AppointmentTypeView {
        AppointmentTypeView {
            id: entry.id,
            name: entry.name.clone(),
            description: entry.description.clone(),
            duration: entry.duration,
            icon: entry.icon.clone(),
            color: entry.color.clone(),
            athena_appointment_type_id: entry.athena_appointment_type_id.clone(),
            providers: entry
                .providers
                .iter()
                .filter_map(|id| self.find_provider(*id).cloned())
                .collect(),
            active: entry.active,
        }
    }

    pub(crate) fn next_service_type_id(&self) -> u32 {
        self.service_types.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    pub(crate) fn next_provider_id(&self) -> u32 {
        self.providers.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}

// ==============================================================================
// ADMIN REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration: u32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub athena_appointment_type_id: String,
    #[serde(default)]
    pub providers: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub athena_appointment_type_id: Option<String>,
    pub providers: Option<Vec<u32>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub specialty: String,
    pub athena_provider_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub athena_provider_id: Option<String>,
}

// ==============================================================================
// ATHENA ADMIN RESULTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSyncReport {
    pub received: usize,
    pub synced_count: usize,
    pub added_count: usize,
    pub total_providers: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub practice_id: String,
    pub environment: String,
    pub providers_count: usize,
    pub practice_info: serde_json::Value,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Unexpected Athena response: {0}")]
    InvalidResponse(String),
}
