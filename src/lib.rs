pub mod api;
pub mod app_config;
pub mod domain;
pub mod geofence;
pub mod ingestion;
pub mod store;
pub mod tracker;
