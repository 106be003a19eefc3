//! Correlation ids for store operations
//!
//! Every Data Store operation (load, synchronize, create, purge) mints an
//! `OperationId` so that the per-table events it emits can be grouped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one store operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Generate a new time-ordered id (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an id produced elsewhere (e.g. by the caller's job runner)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_ids_are_unique() {
        let a = OperationId::new();
        let b = OperationId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_display_matches_inner() {
        let id = OperationId::from_string("op-1".to_string());
        assert_eq!(id.to_string(), "op-1");
    }
}
