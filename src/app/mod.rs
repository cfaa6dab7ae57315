pub mod config_store;
pub mod domain;
pub mod routes;
