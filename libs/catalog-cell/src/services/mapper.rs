// libs/catalog-cell/src/services/mapper.rs
use crate::models::{CatalogError, CatalogSnapshot, Provider, ServiceCatalogEntry};

/// Translates internal catalog ids to Athena ids and back. Pure lookups over
/// one snapshot; nothing here touches the network or mutates state.
pub struct IdentityMapper<'a> {
    catalog: &'a CatalogSnapshot,
}

impl<'a> IdentityMapper<'a> {
    pub fn new(catalog: &'a CatalogSnapshot) -> Self {
        Self { catalog }
    }

    /// Active service type, as required for new bookings and slot searches.
    pub fn bookable_service_type(&self, id: u32) -> Result<&'a ServiceCatalogEntry, CatalogError> {
        self.catalog
            .find_service_type(id)
            .filter(|entry| entry.active)
            .ok_or_else(|| CatalogError::NotFound("Appointment type".to_string()))
    }

    pub fn provider(&self, id: u32) -> Result<&'a Provider, CatalogError> {
        self.catalog
            .find_provider(id)
            .ok_or_else(|| CatalogError::NotFound("Provider".to_string()))
    }

    pub fn external_appointment_type(&self, id: u32) -> Result<&'a str, CatalogError> {
        self.bookable_service_type(id)
            .map(|entry| entry.athena_appointment_type_id.as_str())
    }

    pub fn external_provider(&self, id: u32) -> Result<&'a str, CatalogError> {
        self.provider(id).map(|p| p.athena_provider_id.as_str())
    }

    pub fn internal_provider(&self, athena_provider_id: &str) -> Result<u32, CatalogError> {
        self.catalog
            .find_provider_by_external(athena_provider_id)
            .map(|p| p.id)
            .ok_or_else(|| CatalogError::NotFound(format!("Athena provider {}", athena_provider_id)))
    }

    /// Fails when the provider does not offer the service.
    pub fn ensure_offered(&self, service_id: u32, provider_id: u32) -> Result<(), CatalogError> {
        let entry = self.bookable_service_type(service_id)?;
        let provider = self.provider(provider_id)?;

        if entry.providers.contains(&provider.id) {
            Ok(())
        } else {
            Err(CatalogError::Validation(format!(
                "{} does not offer {}",
                provider.name, entry.name
            )))
        }
    }
}
