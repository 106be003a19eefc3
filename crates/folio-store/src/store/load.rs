//! Load: stream every table's rows into the record set

use super::{cancelled, DataStore, LoadReport, Outcome};
use crate::errors::{store_closed, Result};
use folio_core::records::RecordSet;
use folio_core::status::StatusSink;
use folio_core::types::fields::EVENT_CANCELLED;
use folio_core::types::OperationId;
use folio_core::value::RowId;
use folio_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;
use tracing::{debug, info, warn};

const OP_LOAD: &str = "load";

impl DataStore {
    /// Load every table in dependency order
    ///
    /// Rows whose stored values cannot be decoded are passed to
    /// `RecordSet::reject_row` and counted; the load carries on.
    pub fn load(
        &mut self,
        records: &mut dyn RecordSet,
        status: &mut dyn StatusSink,
    ) -> Result<LoadReport> {
        let op_id = OperationId::new();
        log_op_start!(OP_LOAD, op_id = %op_id, tables = self.schema.len());
        let start = Instant::now();

        match self.load_impl(records, status, &op_id) {
            Ok(report) => {
                log_op_end!(
                    OP_LOAD,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id,
                    rows = report.rows,
                    rejected = report.rejected,
                    outcome = report.outcome.as_str()
                );
                Ok(report)
            }
            Err(err) => {
                let err = self.abort(err);
                log_op_error!(
                    OP_LOAD,
                    &err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id
                );
                Err(err)
            }
        }
    }

    fn load_impl(
        &mut self,
        records: &mut dyn RecordSet,
        status: &mut dyn StatusSink,
        op_id: &OperationId,
    ) -> Result<LoadReport> {
        let Self {
            schema,
            conn,
            cipher,
            ..
        } = self;
        let conn = conn.as_mut().ok_or_else(|| store_closed(OP_LOAD))?;
        let mut report = LoadReport::default();

        status.init_task(OP_LOAD);
        status.set_num_stages(schema.len());

        for table in schema.tables() {
            if cancelled(status) {
                info!(
                    op = OP_LOAD,
                    op_id = %op_id,
                    event = EVENT_CANCELLED,
                    table = table.name(),
                    "load cancelled"
                );
                report.outcome = Outcome::Cancelled;
                return Ok(report);
            }
            status.start_task(table.name());

            let sql = schema.load_string(table.name())?;
            let mut rows = 0usize;
            conn.for_each_row(sql, |cursor| {
                let decoded = table.decode_row(cursor, &**cipher).and_then(|row| {
                    if let Some((id, material)) = table.key_material(&row)? {
                        cipher.register_key_set(id, &material)?;
                    }
                    Ok(row)
                });
                match decoded {
                    Ok(row) => {
                        records.load_row(table.name(), row)?;
                        rows += 1;
                    }
                    Err(err) if err.is_data() => {
                        warn!(
                            op = OP_LOAD,
                            table = table.name(),
                            row_id = err.row_id(),
                            err_code = err.code(),
                            "row rejected"
                        );
                        records.reject_row(table.name(), err.row_id().map(RowId), &err);
                        report.rejected += 1;
                    }
                    Err(err) => return Err(err),
                }
                Ok(())
            })?;

            debug!(
                op = OP_LOAD,
                op_id = %op_id,
                table = table.name(),
                stage = "load",
                rows,
                "table loaded"
            );
            report.rows += rows;
        }
        Ok(report)
    }
}
