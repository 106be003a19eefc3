//! Folio Core Types - shared leaf types
//!
//! Provides:
//! - Operation correlation ids carried through store operations and log events
//! - `Sensitive<T>` for credentials and key material that must never be logged
//! - Canonical field and event names for structured logging

pub mod correlation;
pub mod fields;
pub mod sensitive;

pub use correlation::OperationId;
pub use sensitive::Sensitive;
