pub mod agents;
pub mod audit_adapter;
pub mod audit_logger;
pub mod config;
pub mod credential_store;
pub mod keys;
