pub mod audit;
pub mod auth;
pub mod catalog;
pub mod shipment;
pub mod tenancy;
