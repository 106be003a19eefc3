//! Batch Control: intermediate commits during bulk writes

use crate::errors::{ExError, ExErrorKind, Result};

/// Counts pending writes against a fixed capacity
///
/// `record` reports when the pending count has reached capacity; the owner
/// must then commit and call `reset`. The count therefore never exceeds the
/// capacity.
#[derive(Debug, Clone)]
pub struct BatchControl {
    capacity: usize,
    pending: usize,
}

impl BatchControl {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ExError::new(ExErrorKind::InvalidConfig)
                .with_message("batch size must be at least 1"));
        }
        Ok(Self {
            capacity,
            pending: 0,
        })
    }

    /// Count one write; true when a commit is due
    #[must_use]
    pub fn record(&mut self) -> bool {
        self.pending += 1;
        self.pending >= self.capacity
    }

    pub fn reset(&mut self) {
        self.pending = 0;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
