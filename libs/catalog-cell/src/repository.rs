// libs/catalog-cell/src/repository.rs
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::{
    CatalogError, CatalogSnapshot, NewProvider, NewServiceType, Provider, ProviderUpdate,
    ServiceCatalogEntry, ServiceTypeUpdate,
};

/// Storage for services and providers. Readers take a snapshot and work on
/// it for the rest of the request; writers publish a new snapshot.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn snapshot(&self) -> Arc<CatalogSnapshot>;

    async fn create_service_type(
        &self,
        new: NewServiceType,
    ) -> Result<ServiceCatalogEntry, CatalogError>;

    async fn update_service_type(
        &self,
        id: u32,
        update: ServiceTypeUpdate,
    ) -> Result<ServiceCatalogEntry, CatalogError>;

    async fn deactivate_service_type(&self, id: u32) -> Result<ServiceCatalogEntry, CatalogError>;

    async fn create_provider(&self, new: NewProvider) -> Result<Provider, CatalogError>;

    async fn update_provider(&self, id: u32, update: ProviderUpdate)
        -> Result<Provider, CatalogError>;

    async fn list_active_service_types(&self) -> Vec<ServiceCatalogEntry> {
        self.snapshot().await.active_service_types().cloned().collect()
    }

    async fn find_service_type(&self, id: u32) -> Option<ServiceCatalogEntry> {
        self.snapshot().await.find_service_type(id).cloned()
    }

    async fn find_provider(&self, id: u32) -> Option<Provider> {
        self.snapshot().await.find_provider(id).cloned()
    }
}

/// Copy-on-write in-memory catalog.
pub struct InMemoryCatalogRepository {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl InMemoryCatalogRepository {
    pub fn new(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        for entry in &snapshot.service_types {
            validate_service_type(&snapshot, entry)?;
        }
        for provider in &snapshot.providers {
            ensure_unique_external_id(&snapshot, &provider.athena_provider_id, Some(provider.id))?;
        }

        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn empty() -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    /// The clinic's starting catalog.
    pub fn with_default_catalog() -> Self {
        Self {
            current: RwLock::new(Arc::new(default_catalog())),
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    async fn create_service_type(
        &self,
        new: NewServiceType,
    ) -> Result<ServiceCatalogEntry, CatalogError> {
        let mut current = self.current.write().await;
        let mut next = CatalogSnapshot::clone(&current);

        let entry = ServiceCatalogEntry {
            id: next.next_service_type_id(),
            name: new.name.trim().to_string(),
            description: new.description,
            duration: new.duration,
            icon: new.icon,
            color: new.color,
            athena_appointment_type_id: new.athena_appointment_type_id.trim().to_string(),
            providers: new.providers,
            active: true,
        };
        validate_service_type(&next, &entry)?;

        next.service_types.push(entry.clone());
        *current = Arc::new(next);

        info!("Created appointment type {}: {}", entry.id, entry.name);
        Ok(entry)
    }

    async fn update_service_type(
        &self,
        id: u32,
        update: ServiceTypeUpdate,
    ) -> Result<ServiceCatalogEntry, CatalogError> {
        let mut current = self.current.write().await;
        let mut next = CatalogSnapshot::clone(&current);

        let index = next
            .service_types
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CatalogError::NotFound("Appointment type".to_string()))?;

        let mut entry = next.service_types[index].clone();
        if let Some(name) = update.name {
            entry.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        if let Some(duration) = update.duration {
            entry.duration = duration;
        }
        if let Some(icon) = update.icon {
            entry.icon = Some(icon);
        }
        if let Some(color) = update.color {
            entry.color = Some(color);
        }
        if let Some(external) = update.athena_appointment_type_id {
            entry.athena_appointment_type_id = external.trim().to_string();
        }
        if let Some(providers) = update.providers {
            entry.providers = providers;
        }
        if let Some(active) = update.active {
            entry.active = active;
        }
        validate_service_type(&next, &entry)?;

        next.service_types[index] = entry.clone();
        *current = Arc::new(next);

        info!("Updated appointment type {}: {}", entry.id, entry.name);
        Ok(entry)
    }

    async fn deactivate_service_type(&self, id: u32) -> Result<ServiceCatalogEntry, CatalogError> {
        let entry = self
            .update_service_type(
                id,
                ServiceTypeUpdate {
                    active: Some(false),
                    ..ServiceTypeUpdate::default()
                },
            )
            .await?;

        info!("Deactivated appointment type {}: {}", entry.id, entry.name);
        Ok(entry)
    }

    async fn create_provider(&self, new: NewProvider) -> Result<Provider, CatalogError> {
        let mut current = self.current.write().await;
        let mut next = CatalogSnapshot::clone(&current);

        let provider = Provider {
            id: next.next_provider_id(),
            name: new.name.trim().to_string(),
            specialty: new.specialty,
            athena_provider_id: new.athena_provider_id.trim().to_string(),
        };
        validate_provider(&next, &provider)?;

        next.providers.push(provider.clone());
        *current = Arc::new(next);

        info!("Added provider {}: {}", provider.id, provider.name);
        Ok(provider)
    }

    async fn update_provider(
        &self,
        id: u32,
        update: ProviderUpdate,
    ) -> Result<Provider, CatalogError> {
        let mut current = self.current.write().await;
        let mut next = CatalogSnapshot::clone(&current);

        let index = next
            .providers
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CatalogError::NotFound("Provider".to_string()))?;

        let mut provider = next.providers[index].clone();
        if let Some(name) = update.name {
            provider.name = name.trim().to_string();
        }
        if let Some(specialty) = update.specialty {
            provider.specialty = specialty;
        }
        if let Some(external) = update.athena_provider_id {
            provider.athena_provider_id = external.trim().to_string();
        }
        validate_provider(&next, &provider)?;

        next.providers[index] = provider.clone();
        *current = Arc::new(next);

        info!("Updated provider {}: {}", provider.id, provider.name);
        Ok(provider)
    }
}

fn validate_service_type(
    catalog: &CatalogSnapshot,
    entry: &ServiceCatalogEntry,
) -> Result<(), CatalogError> {
    if entry.name.is_empty() {
        return Err(CatalogError::Validation("name is required".to_string()));
    }
    if entry.athena_appointment_type_id.is_empty() {
        return Err(CatalogError::Validation(
            "athenaAppointmentTypeId is required".to_string(),
        ));
    }
    if entry.duration == 0 {
        return Err(CatalogError::Validation(
            "duration must be greater than zero".to_string(),
        ));
    }
    if let Some(unknown) = entry
        .providers
        .iter()
        .find(|id| catalog.find_provider(**id).is_none())
    {
        return Err(CatalogError::Validation(format!(
            "Unknown provider id {}",
            unknown
        )));
    }
    Ok(())
}

fn validate_provider(catalog: &CatalogSnapshot, provider: &Provider) -> Result<(), CatalogError> {
    if provider.name.is_empty() {
        return Err(CatalogError::Validation("name is required".to_string()));
    }
    if provider.athena_provider_id.is_empty() {
        return Err(CatalogError::Validation(
            "athenaProviderId is required".to_string(),
        ));
    }
    ensure_unique_external_id(catalog, &provider.athena_provider_id, Some(provider.id))
}

fn ensure_unique_external_id(
    catalog: &CatalogSnapshot,
    athena_provider_id: &str,
    own_id: Option<u32>,
) -> Result<(), CatalogError> {
    let clash = catalog
        .providers
        .iter()
        .any(|p| p.athena_provider_id == athena_provider_id && Some(p.id) != own_id);

    if clash {
        return Err(CatalogError::Conflict(format!(
            "Athena provider {} is already mapped",
            athena_provider_id
        )));
    }
    Ok(())
}

pub fn default_catalog() -> CatalogSnapshot {
    let provider = |id: u32, name: &str, specialty: &str| Provider {
        id,
        name: name.to_string(),
        specialty: specialty.to_string(),
        athena_provider_id: id.to_string(),
    };

    let service = |id: u32,
                   name: &str,
                   description: &str,
                   duration: u32,
                   icon: &str,
                   color: &str,
                   athena_id: &str,
                   providers: &[u32]| ServiceCatalogEntry {
        id,
        name: name.to_string(),
        description: description.to_string(),
        duration,
        icon: Some(icon.to_string()),
        color: Some(color.to_string()),
        athena_appointment_type_id: athena_id.to_string(),
        providers: providers.to_vec(),
        active: true,
    };

    CatalogSnapshot {
        providers: vec![
            provider(1, "Dr. Sarah Johnson", "Family Medicine"),
            provider(2, "Dr. Michael Chen", "Internal Medicine"),
            provider(3, "Dr. Emily Rodriguez", "Pediatrics"),
            provider(4, "Dr. Lisa Park", "Urgent Care"),
            provider(5, "Dr. Amanda White", "Cardiology"),
            provider(6, "Dr. Robert Kim", "Dermatology"),
            provider(7, "Dr. Jennifer Lee", "Ophthalmology"),
        ],
        service_types: vec![
            service(
                1,
                "Annual Physical Exam",
                "Comprehensive yearly health checkup including vital signs, lab work, and preventive screenings",
                60,
                "Heart",
                "bg-blue-500",
                "2",
                &[1, 2],
            ),
            service(
                2,
                "Sick Visit",
                "Treatment for acute illness, infections, minor injuries, and urgent health concerns",
                20,
                "Stethoscope",
                "bg-red-500",
                "1",
                &[1, 2, 4],
            ),
            service(
                3,
                "Follow-up Visit",
                "Review test results, monitor treatment progress, and adjust care plans",
                30,
                "Activity",
                "bg-green-500",
                "3",
                &[1, 2, 5],
            ),
            service(
                4,
                "Pediatric Checkup",
                "Well-child visits, vaccinations, growth monitoring, and developmental assessments",
                45,
                "Baby",
                "bg-purple-500",
                "4",
                &[3],
            ),
            service(
                5,
                "Consultation",
                "Specialist consultation for complex conditions and second opinions",
                45,
                "UserCheck",
                "bg-indigo-500",
                "5",
                &[2, 5, 6],
            ),
            service(
                6,
                "Eye Exam",
                "Comprehensive vision screening, eye health assessment, and prescription updates",
                30,
                "Eye",
                "bg-teal-500",
                "6",
                &[7],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_service(providers: Vec<u32>) -> NewServiceType {
        NewServiceType {
            name: "Telehealth Check-in".to_string(),
            description: String::new(),
            duration: 15,
            icon: None,
            color: None,
            athena_appointment_type_id: "41".to_string(),
            providers,
        }
    }

    #[test]
    fn test_default_catalog_is_consistent() {
        assert!(InMemoryCatalogRepository::new(default_catalog()).is_ok());
    }

    #[tokio::test]
    async fn test_create_assigns_next_id_and_activates() {
        let repo = InMemoryCatalogRepository::with_default_catalog();
        let created = repo.create_service_type(new_service(vec![1])).await.unwrap();

        assert_eq!(created.id, 7);
        assert!(created.active);
        assert_eq!(repo.find_service_type(7).await, Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_provider() {
        let repo = InMemoryCatalogRepository::with_default_catalog();
        let result = repo.create_service_type(new_service(vec![1, 99])).await;

        assert_matches!(result, Err(CatalogError::Validation(msg)) if msg.contains("99"));
        assert_eq!(repo.snapshot().await.service_types.len(), 6);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_entry_resolvable() {
        let repo = InMemoryCatalogRepository::with_default_catalog();
        repo.deactivate_service_type(2).await.unwrap();

        let active: Vec<u32> = repo
            .list_active_service_types()
            .await
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(active, vec![1, 3, 4, 5, 6]);

        let retired = repo.find_service_type(2).await.unwrap();
        assert!(!retired.active);
        assert_eq!(retired.athena_appointment_type_id, "1");
    }

    #[tokio::test]
    async fn test_snapshot_unchanged_by_later_writes() {
        let repo = InMemoryCatalogRepository::with_default_catalog();
        let before = repo.snapshot().await;

        repo.update_provider(
            1,
            ProviderUpdate {
                name: Some("Dr. Sarah Johnson-Reyes".to_string()),
                ..ProviderUpdate::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(before.find_provider(1).unwrap().name, "Dr. Sarah Johnson");
        assert_eq!(
            repo.snapshot().await.find_provider(1).unwrap().name,
            "Dr. Sarah Johnson-Reyes"
        );
    }

    #[tokio::test]
    async fn test_external_provider_id_must_stay_unique() {
        let repo = InMemoryCatalogRepository::with_default_catalog();
        let result = repo
            .update_provider(
                1,
                ProviderUpdate {
                    athena_provider_id: Some("2".to_string()),
                    ..ProviderUpdate::default()
                },
            )
            .await;

        assert_matches!(result, Err(CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_entry_is_not_found() {
        let repo = InMemoryCatalogRepository::empty();
        let result = repo
            .update_service_type(3, ServiceTypeUpdate::default())
            .await;

        assert_matches!(result, Err(CatalogError::NotFound(_)));
    }
}
