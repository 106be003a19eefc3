//! In-memory record book
//!
//! A ready-made `RecordSet`: loaded rows per table plus staged inserts,
//! updates and deletes. Staged changes leave the book only once the store
//! reports them committed; a rollback puts them back in play.

use folio_core::errors::ExError;
use folio_core::records::{PendingInsert, RecordHandle, RecordSet};
use folio_core::value::{RowId, RowValues};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
enum Ack {
    Inserted {
        table: String,
        handle: RecordHandle,
        id: RowId,
    },
    Updated {
        table: String,
        id: RowId,
    },
    Deleted {
        table: String,
        id: RowId,
    },
}

#[derive(Debug, Default)]
pub struct RecordBook {
    loaded: BTreeMap<String, Vec<RowValues>>,
    rejected: BTreeMap<String, Vec<(Option<RowId>, ExError)>>,
    inserts: BTreeMap<String, Vec<PendingInsert>>,
    /// child handle -> (reference column, parent handle)
    links: HashMap<RecordHandle, Vec<(String, RecordHandle)>>,
    assigned: HashMap<RecordHandle, RowId>,
    updates: BTreeMap<String, Vec<RowValues>>,
    deletes: BTreeMap<String, Vec<RowId>>,
    unconfirmed: Vec<Ack>,
    next_handle: u64,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new row; the returned handle identifies it until it has an id
    pub fn stage_insert(&mut self, table: &str, values: RowValues) -> RecordHandle {
        self.next_handle += 1;
        let handle = RecordHandle(self.next_handle);
        self.inserts
            .entry(table.to_string())
            .or_default()
            .push(PendingInsert { handle, values });
        handle
    }

    /// Fill `column` of the staged row `child` with the id `parent` gets
    /// when it is inserted
    pub fn link(&mut self, child: RecordHandle, column: &str, parent: RecordHandle) {
        self.links
            .entry(child)
            .or_default()
            .push((column.to_string(), parent));
    }

    /// Stage changed fields of an existing row; `row` must carry its id
    pub fn stage_update(&mut self, table: &str, row: RowValues) {
        self.updates.entry(table.to_string()).or_default().push(row);
    }

    pub fn stage_delete(&mut self, table: &str, id: RowId) {
        self.deletes.entry(table.to_string()).or_default().push(id);
    }

    /// Rows loaded or committed for `table`, in load order
    pub fn rows(&self, table: &str) -> &[RowValues] {
        self.loaded.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: RowId) -> Option<&RowValues> {
        self.rows(table).iter().find(|r| r.id() == Some(id))
    }

    /// Rows of `table` that failed to decode during load
    pub fn rejected(&self, table: &str) -> &[(Option<RowId>, ExError)] {
        self.rejected.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn assigned_id(&self, handle: RecordHandle) -> Option<RowId> {
        self.assigned.get(&handle).copied()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.inserts.values().any(|v| !v.is_empty())
            || self.updates.values().any(|v| !v.is_empty())
            || self.deletes.values().any(|v| !v.is_empty())
    }

    /// Forget loaded and rejected rows ahead of a reload
    pub fn clear_loaded(&mut self) {
        self.loaded.clear();
        self.rejected.clear();
    }

    fn resolved(&self, insert: &PendingInsert) -> RowValues {
        let mut values = insert.values.clone();
        for (column, parent) in self.links.get(&insert.handle).into_iter().flatten() {
            if let Some(id) = self.assigned.get(parent) {
                values.set(column, *id);
            }
        }
        values
    }

    fn confirm(&mut self, ack: Ack) {
        match ack {
            Ack::Inserted { table, handle, id } => {
                let Some(pending) = self.inserts.get_mut(&table) else {
                    return;
                };
                let Some(position) = pending.iter().position(|p| p.handle == handle) else {
                    return;
                };
                let insert = pending.remove(position);
                let mut row = self.resolved(&insert);
                row.set(folio_core::ID_COLUMN, id);
                self.links.remove(&handle);
                self.loaded.entry(table).or_default().push(row);
            }
            Ack::Updated { table, id } => {
                let Some(pending) = self.updates.get_mut(&table) else {
                    return;
                };
                let Some(position) = pending.iter().position(|r| r.id() == Some(id)) else {
                    return;
                };
                let changes = pending.remove(position);
                if let Some(row) = self
                    .loaded
                    .get_mut(&table)
                    .and_then(|rows| rows.iter_mut().find(|r| r.id() == Some(id)))
                {
                    for field in changes.fields() {
                        if let Some(value) = changes.get(field) {
                            row.set(field, value.clone());
                        }
                    }
                }
            }
            Ack::Deleted { table, id } => {
                if let Some(pending) = self.deletes.get_mut(&table) {
                    pending.retain(|d| *d != id);
                }
                if let Some(rows) = self.loaded.get_mut(&table) {
                    rows.retain(|r| r.id() != Some(id));
                }
            }
        }
    }
}

impl RecordSet for RecordBook {
    fn load_row(&mut self, table: &str, row: RowValues) -> folio_core::Result<()> {
        self.loaded.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    fn reject_row(&mut self, table: &str, id: Option<RowId>, error: &ExError) {
        self.rejected
            .entry(table.to_string())
            .or_default()
            .push((id, error.clone()));
    }

    fn pending_inserts(&self, table: &str) -> Vec<PendingInsert> {
        self.inserts
            .get(table)
            .into_iter()
            .flatten()
            .map(|insert| PendingInsert {
                handle: insert.handle,
                values: self.resolved(insert),
            })
            .collect()
    }

    fn inserted(&mut self, table: &str, handle: RecordHandle, id: RowId) {
        self.assigned.insert(handle, id);
        self.unconfirmed.push(Ack::Inserted {
            table: table.to_string(),
            handle,
            id,
        });
    }

    fn pending_updates(&self, table: &str) -> Vec<RowValues> {
        self.updates.get(table).cloned().unwrap_or_default()
    }

    fn pending_deletes(&self, table: &str) -> Vec<RowId> {
        self.deletes.get(table).cloned().unwrap_or_default()
    }

    fn updated(&mut self, table: &str, id: RowId) {
        self.unconfirmed.push(Ack::Updated {
            table: table.to_string(),
            id,
        });
    }

    fn deleted(&mut self, table: &str, id: RowId) {
        self.unconfirmed.push(Ack::Deleted {
            table: table.to_string(),
            id,
        });
    }

    fn committed(&mut self) {
        for ack in std::mem::take(&mut self.unconfirmed) {
            self.confirm(ack);
        }
    }

    fn rolled_back(&mut self) {
        for ack in std::mem::take(&mut self.unconfirmed) {
            if let Ack::Inserted { handle, .. } = ack {
                self.assigned.remove(&handle);
            }
        }
    }
}
