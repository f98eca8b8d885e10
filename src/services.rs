pub mod auth;
pub mod authz;
pub mod sheets;
pub mod shipment_service;
pub mod tenancy_service;
