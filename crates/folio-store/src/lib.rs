//! Folio Store - relational backing for folio schemas
//!
//! Provides:
//! - SQLite connection management with commit/rollback accounting
//! - The data store orchestrating load, synchronize, create and purge
//! - AES-256-GCM key vault for encrypted columns
//! - YAML schema manifests and store configuration
//! - An in-memory record book implementing the domain record interface

pub mod config;
pub mod connection;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod manifest;
pub mod records;
pub mod store;

// Re-export key types
pub use config::StoreConfig;
pub use errors::Result;
pub use records::RecordBook;
pub use store::{DataStore, LoadReport, Outcome, SyncReport};
