#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use folio_core::column::{DecimalKind, SortOrder};
use folio_core::dialect::DriverKind;
use folio_core::errors::Result;
use folio_core::records::{PendingInsert, RecordHandle, RecordSet};
use folio_core::status::{Cancelled, StatusSink};
use folio_core::value::{RowId, RowValues};
use folio_core::{ExError, Schema, SchemaBuilder, TableBuilder};
use folio_store::{DataStore, RecordBook, StoreConfig};
use std::path::Path;

/// A -> B -> C reference chain
pub fn chain_schema() -> Schema {
    SchemaBuilder::new(DriverKind::Sqlite)
        .table(TableBuilder::new("A").string("name", 20).sort(SortOrder::Ascending))
        .table(
            TableBuilder::new("B")
                .reference("a", "A")
                .sort(SortOrder::Ascending)
                .string("label", 20)
                .sort(SortOrder::Ascending),
        )
        .table(
            TableBuilder::new("C")
                .reference("b", "B")
                .sort(SortOrder::Ascending)
                .decimal("amount", DecimalKind::Money)
                .nullable(),
        )
        .build()
        .unwrap()
}

/// Fresh in-memory store with its tables created
pub fn memory_store(schema: Schema, batch_size: usize) -> DataStore {
    let mut store =
        DataStore::open(schema, StoreConfig::in_memory().with_batch_size(batch_size)).unwrap();
    store.create(&mut RecordingStatus::default()).unwrap();
    store
}

/// Store backed by a database file, so a second connection sees only
/// committed work
pub fn file_store(schema: Schema, path: &Path, batch_size: usize) -> DataStore {
    let config = StoreConfig::sqlite(path.to_string_lossy().to_string()).with_batch_size(batch_size);
    let mut store = DataStore::open(schema, config).unwrap();
    store.create(&mut RecordingStatus::default()).unwrap();
    store
}

/// Status sink that records every call and can cancel after a number of
/// cancellation checks
#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub tasks: Vec<String>,
    pub stages: Vec<String>,
    pub num_stages: usize,
    pub checks: usize,
    pub cancel_after: Option<usize>,
}

impl RecordingStatus {
    /// Allow `checks` cancellation checks, refuse the next one
    pub fn cancel_after(checks: usize) -> Self {
        Self {
            cancel_after: Some(checks),
            ..Self::default()
        }
    }
}

impl StatusSink for RecordingStatus {
    fn init_task(&mut self, name: &str) {
        self.tasks.push(name.to_string());
    }

    fn set_num_stages(&mut self, stages: usize) {
        self.num_stages = stages;
    }

    fn start_task(&mut self, name: &str) {
        self.stages.push(name.to_string());
    }

    fn check_for_cancellation(&mut self) -> std::result::Result<(), Cancelled> {
        self.checks += 1;
        match self.cancel_after {
            Some(limit) if self.checks > limit => Err(Cancelled),
            _ => Ok(()),
        }
    }
}

/// Record book that also logs the order of store callbacks
#[derive(Debug, Default)]
pub struct RecordingBook {
    pub book: RecordBook,
    pub events: Vec<(String, String)>,
}

impl RecordingBook {
    fn log(&mut self, event: &str, table: &str) {
        self.events.push((event.to_string(), table.to_string()));
    }

    pub fn writes(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter(|(e, _)| matches!(e.as_str(), "inserted" | "updated" | "deleted"))
            .map(|(e, t)| (e.as_str(), t.as_str()))
            .collect()
    }
}

impl RecordSet for RecordingBook {
    fn load_row(&mut self, table: &str, row: RowValues) -> Result<()> {
        self.log("loaded", table);
        self.book.load_row(table, row)
    }

    fn reject_row(&mut self, table: &str, id: Option<RowId>, error: &ExError) {
        self.log("rejected", table);
        self.book.reject_row(table, id, error);
    }

    fn pending_inserts(&self, table: &str) -> Vec<PendingInsert> {
        self.book.pending_inserts(table)
    }

    fn inserted(&mut self, table: &str, handle: RecordHandle, id: RowId) {
        self.log("inserted", table);
        self.book.inserted(table, handle, id);
    }

    fn pending_updates(&self, table: &str) -> Vec<RowValues> {
        self.book.pending_updates(table)
    }

    fn pending_deletes(&self, table: &str) -> Vec<RowId> {
        self.book.pending_deletes(table)
    }

    fn updated(&mut self, table: &str, id: RowId) {
        self.log("updated", table);
        self.book.updated(table, id);
    }

    fn deleted(&mut self, table: &str, id: RowId) {
        self.log("deleted", table);
        self.book.deleted(table, id);
    }

    fn committed(&mut self) {
        self.log("committed", "");
        self.book.committed();
    }

    fn rolled_back(&mut self) {
        self.log("rolled_back", "");
        self.book.rolled_back();
    }

    fn synchronized(&mut self) {
        self.log("synchronized", "");
        self.book.synchronized();
    }
}
