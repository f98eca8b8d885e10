pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod shipment_repo;
pub use shipment_repo::ShipmentRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
