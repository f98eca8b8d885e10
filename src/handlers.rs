// src/handlers.rs

pub mod auth;
pub mod catalog;
pub mod shipments;
pub mod tenancy;
pub mod users;
