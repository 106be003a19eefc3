//! Synchronize: the three-phase write
//!
//! 1. inserts, parents first
//! 2. updates, parents first
//! 3. deletes, children first
//!
//! Every write is counted against the batch size; reaching it commits and
//! resets the counter. Whatever is left uncommitted at the end is committed
//! once more.

use super::{cancelled, DataStore, Outcome, SyncReport};
use crate::connection::StoreConnection;
use crate::errors::{store_closed, Result};
use folio_core::batch::BatchControl;
use folio_core::cipher::RowCipher;
use folio_core::records::RecordSet;
use folio_core::status::StatusSink;
use folio_core::table::TableDef;
use folio_core::types::fields::EVENT_CANCELLED;
use folio_core::types::OperationId;
use folio_core::value::{RowId, RowValues};
use folio_core::wire::WireValue;
use folio_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;
use tracing::{debug, info};

const OP_SYNC: &str = "synchronize";

/// Count one write; commit when the batch is full
fn record_write(
    conn: &mut StoreConnection,
    batch: &mut BatchControl,
    records: &mut dyn RecordSet,
) -> Result<()> {
    if batch.record() {
        conn.commit()?;
        batch.reset();
        records.committed();
        debug!(op = OP_SYNC, "batch committed");
    }
    Ok(())
}

fn stage_written(op_id: &OperationId, table: &TableDef, stage: &str, rows: usize) {
    if rows > 0 {
        debug!(
            op = OP_SYNC,
            op_id = %op_id,
            table = table.name(),
            stage,
            rows,
            "table written"
        );
    }
}

/// Key-set rows make their data key available as soon as they are written
fn register_key_set(
    table: &TableDef,
    cipher: &mut dyn RowCipher,
    id: RowId,
    values: &RowValues,
) -> Result<()> {
    if let Some(column) = table.key_material_column() {
        if let Some(material) = values.binary(&column.name)? {
            cipher.register_key_set(id, &material)?;
        }
    }
    Ok(())
}

impl DataStore {
    /// Write every staged change of `records`
    ///
    /// On failure the uncommitted part is rolled back; batches committed
    /// earlier in the pass stay committed.
    pub fn synchronize(
        &mut self,
        records: &mut dyn RecordSet,
        status: &mut dyn StatusSink,
    ) -> Result<SyncReport> {
        let op_id = OperationId::new();
        log_op_start!(
            OP_SYNC,
            op_id = %op_id,
            tables = self.schema.len(),
            batch_size = self.batch.capacity()
        );
        let start = Instant::now();

        match self.sync_impl(records, status, &op_id) {
            Ok(report) => {
                log_op_end!(
                    OP_SYNC,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id,
                    inserted = report.inserted,
                    updated = report.updated,
                    deleted = report.deleted,
                    commits = report.commits,
                    outcome = report.outcome.as_str()
                );
                Ok(report)
            }
            Err(err) => {
                let err = self.abort(err);
                records.rolled_back();
                log_op_error!(
                    OP_SYNC,
                    &err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id
                );
                Err(err)
            }
        }
    }

    fn sync_impl(
        &mut self,
        records: &mut dyn RecordSet,
        status: &mut dyn StatusSink,
        op_id: &OperationId,
    ) -> Result<SyncReport> {
        let Self {
            schema,
            conn,
            cipher,
            batch,
            ..
        } = self;
        let conn = conn.as_mut().ok_or_else(|| store_closed(OP_SYNC))?;
        let commits_before = conn.stats().commits;
        let tables = schema.tables();
        let mut report = SyncReport::default();

        status.init_task(OP_SYNC);
        status.set_num_stages(tables.len() * 3);
        batch.reset();

        'phases: {
            for table in tables {
                if cancelled(status) {
                    report.outcome = Outcome::Cancelled;
                    break 'phases;
                }
                status.start_task(&format!("insert {}", table.name()));
                let sql = table.insert_string();
                let pending_inserts = records.pending_inserts(table.name());
                let rows = pending_inserts.len();
                for pending in pending_inserts {
                    let params = table.encode_insert(&pending.values, &**cipher)?;
                    let id = conn
                        .insert(&sql, &params)
                        .map_err(|e| e.with_table(table.name()))?;
                    register_key_set(table, &mut **cipher, id, &pending.values)?;
                    records.inserted(table.name(), pending.handle, id);
                    report.inserted += 1;
                    record_write(conn, batch, records)?;
                }
                stage_written(op_id, table, "insert", rows);
            }

            for table in tables {
                if cancelled(status) {
                    report.outcome = Outcome::Cancelled;
                    break 'phases;
                }
                status.start_task(&format!("update {}", table.name()));
                let mut rows = 0usize;
                for row in records.pending_updates(table.name()) {
                    let Some(update) = table.encode_update(&row, &**cipher)? else {
                        continue;
                    };
                    let sql = table.update_string(&update.column_names());
                    conn.execute(&sql, &update.params).map_err(|e| {
                        e.with_table(table.name()).with_row_id(update.id.get())
                    })?;
                    register_key_set(table, &mut **cipher, update.id, &row)?;
                    records.updated(table.name(), update.id);
                    report.updated += 1;
                    rows += 1;
                    record_write(conn, batch, records)?;
                }
                stage_written(op_id, table, "update", rows);
            }

            for table in tables.iter().rev() {
                if cancelled(status) {
                    report.outcome = Outcome::Cancelled;
                    break 'phases;
                }
                status.start_task(&format!("delete {}", table.name()));
                let sql = table.delete_string();
                let pending_deletes = records.pending_deletes(table.name());
                let rows = pending_deletes.len();
                for id in pending_deletes {
                    conn.execute(&sql, &[WireValue::Integer(id.get())])
                        .map_err(|e| e.with_table(table.name()).with_row_id(id.get()))?;
                    records.deleted(table.name(), id);
                    report.deleted += 1;
                    record_write(conn, batch, records)?;
                }
                stage_written(op_id, table, "delete", rows);
            }
        }

        if conn.commit()? {
            records.committed();
        }
        batch.reset();

        if report.outcome.is_cancelled() {
            info!(
                op = OP_SYNC,
                op_id = %op_id,
                event = EVENT_CANCELLED,
                writes = report.writes(),
                "synchronize cancelled"
            );
        } else {
            records.synchronized();
        }
        report.commits = conn.stats().commits - commits_before;
        Ok(report)
    }
}
