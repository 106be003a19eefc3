//! Create, drop and purge

use super::{cancelled, DataStore, Outcome};
use crate::errors::{store_closed, Result};
use folio_core::status::StatusSink;
use folio_core::types::fields::EVENT_CANCELLED;
use folio_core::types::OperationId;
use folio_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;
use tracing::{debug, info};

const OP_CREATE: &str = "create";
const OP_DROP: &str = "drop_schema";
const OP_PURGE: &str = "purge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Drop,
    Create,
    Purge,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Drop => "drop",
            Step::Create => "create",
            Step::Purge => "purge",
        }
    }
}

impl DataStore {
    /// Drop every table (children first), then create every table and its
    /// sort index (parents first). Absent tables are not an error.
    pub fn create(&mut self, status: &mut dyn StatusSink) -> Result<Outcome> {
        self.run_steps(OP_CREATE, &[Step::Drop, Step::Create], status)
    }

    /// Drop every table, children first
    pub fn drop_schema(&mut self, status: &mut dyn StatusSink) -> Result<Outcome> {
        self.run_steps(OP_DROP, &[Step::Drop], status)
    }

    /// Delete every row of every table, children first, keeping the schema
    pub fn purge(&mut self, status: &mut dyn StatusSink) -> Result<Outcome> {
        self.run_steps(OP_PURGE, &[Step::Purge], status)
    }

    fn run_steps(
        &mut self,
        op: &'static str,
        steps: &[Step],
        status: &mut dyn StatusSink,
    ) -> Result<Outcome> {
        let op_id = OperationId::new();
        log_op_start!(op, op_id = %op_id, tables = self.schema.len());
        let start = Instant::now();

        match self.run_steps_impl(op, steps, status, &op_id) {
            Ok(outcome) => {
                log_op_end!(
                    op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id,
                    outcome = outcome.as_str()
                );
                Ok(outcome)
            }
            Err(err) => {
                let err = self.abort(err);
                log_op_error!(
                    op,
                    &err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    op_id = %op_id
                );
                Err(err)
            }
        }
    }

    fn run_steps_impl(
        &mut self,
        op: &'static str,
        steps: &[Step],
        status: &mut dyn StatusSink,
        op_id: &OperationId,
    ) -> Result<Outcome> {
        let Self { schema, conn, .. } = self;
        let conn = conn.as_mut().ok_or_else(|| store_closed(op))?;
        let tables = schema.tables();
        let mut outcome = Outcome::Completed;

        status.init_task(op);
        status.set_num_stages(tables.len() * steps.len());

        'steps: for step in steps {
            let ordered: Vec<_> = match step {
                Step::Create => tables.iter().collect(),
                Step::Drop | Step::Purge => tables.iter().rev().collect(),
            };
            for table in ordered {
                if cancelled(status) {
                    info!(op, op_id = %op_id, event = EVENT_CANCELLED, table = table.name());
                    outcome = Outcome::Cancelled;
                    break 'steps;
                }
                status.start_task(&format!("{} {}", step.name(), table.name()));
                match step {
                    Step::Drop => {
                        for sql in table.drop_strings() {
                            conn.execute_ddl(&sql)?;
                        }
                    }
                    Step::Create => {
                        conn.execute_ddl(&table.create_string())?;
                        if let Some(index) = table.index_string() {
                            conn.execute_ddl(&index)?;
                        }
                    }
                    Step::Purge => {
                        let removed = conn.execute(&table.purge_string(), &[])?;
                        debug!(op, op_id = %op_id, table = table.name(), rows = removed, "table purged");
                    }
                }
                debug!(op, op_id = %op_id, table = table.name(), stage = step.name(), "stage done");
            }
        }

        conn.commit()?;
        Ok(outcome)
    }
}
