// libs/catalog-cell/src/services/mod.rs

pub mod athena_admin;
pub mod mapper;

pub use athena_admin::AthenaAdminService;
pub use mapper::IdentityMapper;
