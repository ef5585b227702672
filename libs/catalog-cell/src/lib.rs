// libs/catalog-cell/src/lib.rs
//! # Catalog Cell
//!
//! The clinic's service catalog: appointment types, providers and their
//! mapping to athenahealth identifiers.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Catalog Cell                      |
//! +-----------------------------------------------------+
//! |  handlers.rs    |  Public listing + admin endpoints |
//! |  router.rs      |  Route definitions                |
//! |  models.rs      |  Entities, requests, errors       |
//! |  repository.rs  |  CatalogRepository + in-memory    |
//! |  services/      |                                   |
//! |    mapper.rs    |  Internal <-> Athena id mapping   |
//! |    athena_admin.rs | Provider sync, connection test |
//! +-----------------------------------------------------+
//! ```

pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use models::{
    AppointmentTypeView, CatalogError, CatalogSnapshot, NewProvider, NewServiceType, Provider,
    ProviderUpdate, ServiceCatalogEntry, ServiceTypeUpdate,
};
pub use repository::{default_catalog, CatalogRepository, InMemoryCatalogRepository};
pub use router::{catalog_routes, CatalogState};
pub use services::{AthenaAdminService, IdentityMapper};
