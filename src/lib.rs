pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod provisioning;
pub mod roles;
pub mod routes;
pub mod schema;
pub mod state;
pub mod tenancy;
