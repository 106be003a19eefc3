//! Domain record interface
//!
//! The Data Store never owns domain objects. It pulls staged changes from a
//! `RecordSet` table by table and pushes loaded rows back into it, always as
//! `RowValues` keyed by field identity.

use crate::errors::{ExError, Result};
use crate::value::{RowId, RowValues};

/// Caller-chosen handle for a row that has no identifier yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PendingInsert {
    pub handle: RecordHandle,
    pub values: RowValues,
}

pub trait RecordSet {
    /// A row materialized from `table` during load
    fn load_row(&mut self, table: &str, row: RowValues) -> Result<()>;

    /// A row of `table` failed to decode; loading continues with the next row
    fn reject_row(&mut self, _table: &str, _id: Option<RowId>, _error: &ExError) {}

    /// New rows of `table` not yet persisted
    ///
    /// Called once per table, after every earlier table's inserts have been
    /// assigned identifiers, so references to new parent rows can be filled.
    fn pending_inserts(&self, table: &str) -> Vec<PendingInsert>;

    /// The store assigned `id` to the row staged under `handle`
    fn inserted(&mut self, table: &str, handle: RecordHandle, id: RowId);

    /// Changed rows of `table`; each carries its identifier and only the
    /// fields that changed
    fn pending_updates(&self, table: &str) -> Vec<RowValues>;

    /// Identifiers of rows removed from `table`
    fn pending_deletes(&self, table: &str) -> Vec<RowId>;

    /// The row `id` of `table` was rewritten
    fn updated(&mut self, _table: &str, _id: RowId) {}

    /// The row `id` of `table` was removed
    fn deleted(&mut self, _table: &str, _id: RowId) {}

    /// Every write acknowledged so far is durable
    fn committed(&mut self) {}

    /// Writes acknowledged since the last commit were discarded
    fn rolled_back(&mut self) {}

    /// A synchronize pass ran to completion
    fn synchronized(&mut self) {}
}
