// libs/catalog-cell/src/services/athena_admin.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use shared_athena::{id_field, AthenaClient};

use crate::models::{
    CatalogError, ConnectionReport, NewProvider, ProviderSyncReport, ProviderUpdate, SyncError,
};
use crate::repository::CatalogRepository;
use crate::services::IdentityMapper;

const DEFAULT_SPECIALTY: &str = "General Practice";

/// Operator-facing Athena operations: connectivity check, provider sync and
/// appointment-type discovery for mapping.
pub struct AthenaAdminService {
    athena: Arc<AthenaClient>,
    catalog: Arc<dyn CatalogRepository>,
}

impl AthenaAdminService {
    pub fn new(athena: Arc<AthenaClient>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { athena, catalog }
    }

    pub async fn test_connection(&self) -> Result<ConnectionReport, SyncError> {
        info!("Testing Athena API connection");

        self.athena.verify_credentials().await?;

        let practice_info = self
            .athena
            .get(&self.athena.practice_endpoint("misc/practicestatus"), &[])
            .await?;
        let providers = self
            .athena
            .get(&self.athena.practice_endpoint("providers"), &[])
            .await?;

        let providers_count = providers
            .get("providers")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        info!("Athena API connection test successful");

        Ok(ConnectionReport {
            practice_id: self.athena.practice_id().to_string(),
            environment: self.athena.environment().to_string(),
            providers_count,
            practice_info,
        })
    }

    pub async fn list_athena_appointment_types(&self) -> Result<Vec<Value>, SyncError> {
        debug!("Fetching appointment types from Athena");

        let response = self
            .athena
            .get(&self.athena.practice_endpoint("appointmenttypes"), &[])
            .await?;

        Ok(response
            .get("appointmenttypes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Pulls Athena's provider list into the catalog: known providers (by
    /// Athena id) get their name and specialty refreshed, unknown ones are
    /// added.
    pub async fn sync_providers(&self) -> Result<ProviderSyncReport, SyncError> {
        info!("Syncing providers from Athena");

        let response = self
            .athena
            .get(&self.athena.practice_endpoint("providers"), &[])
            .await?;

        let athena_providers = response
            .get("providers")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SyncError::InvalidResponse("No providers data received from Athena".to_string())
            })?;

        let mut synced_count = 0;
        let mut added_count = 0;

        for athena_provider in athena_providers {
            let Some(athena_id) = id_field(athena_provider, "providerid") else {
                warn!("Skipping Athena provider without providerid");
                continue;
            };

            let name = display_name(athena_provider);
            let specialty = athena_provider
                .get("specialty")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let snapshot = self.catalog.snapshot().await;
            match IdentityMapper::new(&snapshot).internal_provider(&athena_id) {
                Ok(internal_id) => {
                    self.catalog
                        .update_provider(
                            internal_id,
                            ProviderUpdate {
                                name: name.clone(),
                                specialty,
                                athena_provider_id: None,
                            },
                        )
                        .await?;
                    synced_count += 1;
                }
                Err(CatalogError::NotFound(_)) => {
                    let Some(name) = name else {
                        warn!("Skipping Athena provider {} without a name", athena_id);
                        continue;
                    };
                    self.catalog
                        .create_provider(NewProvider {
                            name,
                            specialty: specialty.unwrap_or_else(|| DEFAULT_SPECIALTY.to_string()),
                            athena_provider_id: athena_id,
                        })
                        .await?;
                    added_count += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }

        let total_providers = self.catalog.snapshot().await.providers.len();

        info!(
            "Provider sync completed: {} updated, {} added",
            synced_count, added_count
        );

        Ok(ProviderSyncReport {
            received: athena_providers.len(),
            synced_count,
            added_count,
            total_providers,
        })
    }
}

fn display_name(athena_provider: &Value) -> Option<String> {
    let part = |key: &str| {
        athena_provider
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    };

    let full = format!("{} {}", part("firstname"), part("lastname"));
    let full = full.trim();
    if full.is_empty() {
        None
    } else {
        Some(full.to_string())
    }
}
