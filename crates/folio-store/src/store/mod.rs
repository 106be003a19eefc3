//! Data Store orchestrator
//!
//! Owns the connection, the resolved schema, the row cipher and the batch
//! counter, and drives load, synchronize, create and purge across every
//! table in dependency order. Operations run strictly one at a time; each
//! takes `&mut self`.
//!
//! Failure policy:
//! - any error rolls back the uncommitted portion of the current operation
//! - I/O-class errors also close the connection; `reopen` restores it
//! - data errors during load are reported per row and loading continues

mod lifecycle;
mod load;
mod sync;

use crate::config::StoreConfig;
use crate::connection::{ConnectionStats, StoreConnection};
use crate::crypto::{KeyVault, MasterKey};
use crate::errors::{config_error, store_closed, Result};
use folio_core::batch::BatchControl;
use folio_core::cipher::{NoCipher, RowCipher};
use folio_core::errors::ExError;
use folio_core::status::StatusSink;
use folio_core::Schema;
use folio_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;
use tracing::warn;

const OP_OPEN: &str = "store_open";
const OP_CLOSE: &str = "store_close";
const OP_COUNT: &str = "count";

/// How an operation ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Completed,
    /// The status sink asked to stop; finished tables were committed
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Rows that failed to decode and were handed to `reject_row`
    pub rejected: usize,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Commits issued by this pass, intermediate and final
    pub commits: u64,
    pub outcome: Outcome,
}

impl SyncReport {
    pub fn writes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

pub struct DataStore {
    schema: Schema,
    config: StoreConfig,
    conn: Option<StoreConnection>,
    cipher: Box<dyn RowCipher>,
    batch: BatchControl,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("tables", &self.schema.len())
            .field("config", &self.config)
            .field("open", &self.conn.is_some())
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

impl DataStore {
    /// Open a store for `schema`
    ///
    /// A master key in the configuration enables encrypted columns; a schema
    /// with encrypted columns and no master key is rejected.
    pub fn open(schema: Schema, config: StoreConfig) -> Result<Self> {
        let cipher: Box<dyn RowCipher> = match &config.master_key {
            Some(encoded) => Box::new(KeyVault::new(MasterKey::from_base64(encoded)?)),
            None if schema.has_encrypted_columns() => {
                return Err(config_error(
                    "schema has encrypted columns but no master_key is configured",
                ))
            }
            None => Box::new(NoCipher),
        };
        Self::with_cipher(schema, config, cipher)
    }

    /// Open a store with a caller-supplied row cipher
    pub fn with_cipher(
        schema: Schema,
        config: StoreConfig,
        cipher: Box<dyn RowCipher>,
    ) -> Result<Self> {
        log_op_start!(OP_OPEN, driver = config.driver.name(), tables = schema.len());
        let start = Instant::now();

        let opened = Self::connect(&schema, &config).map_err(|err| {
            log_op_error!(OP_OPEN, &err, duration_ms = start.elapsed().as_millis() as u64);
            err
        })?;
        let batch = BatchControl::new(config.batch_size)?;

        log_op_end!(OP_OPEN, duration_ms = start.elapsed().as_millis() as u64);
        Ok(Self {
            schema,
            config,
            conn: Some(opened),
            cipher,
            batch,
        })
    }

    fn connect(schema: &Schema, config: &StoreConfig) -> Result<StoreConnection> {
        config.validate()?;
        if config.driver != schema.driver() {
            return Err(config_error(&format!(
                "schema was built for {} but the store is configured for {}",
                schema.driver(),
                config.driver
            )));
        }
        StoreConnection::open(config)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Counters of the current connection; `None` while closed
    pub fn stats(&self) -> Option<ConnectionStats> {
        self.conn.as_ref().map(StoreConnection::stats)
    }

    /// Roll back anything uncommitted and release the connection
    pub fn close(&mut self) -> Result<()> {
        self.batch.reset();
        match self.conn.take() {
            Some(conn) => {
                log_op_start!(OP_CLOSE);
                let start = Instant::now();
                conn.close()?;
                log_op_end!(OP_CLOSE, duration_ms = start.elapsed().as_millis() as u64);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Open a fresh connection, closing the current one first
    ///
    /// An in-memory database does not outlive its connection, so an
    /// in-memory store comes back empty and needs `create` again.
    pub fn reopen(&mut self) -> Result<()> {
        self.close()?;
        self.conn = Some(Self::connect(&self.schema, &self.config)?);
        Ok(())
    }

    /// Number of rows currently persisted in `table`
    pub fn count(&mut self, table: &str) -> Result<i64> {
        let sql = self.schema.table(table)?.count_string();
        let conn = self.conn.as_mut().ok_or_else(|| store_closed(OP_COUNT))?;
        match conn.count(&sql) {
            Ok(n) => Ok(n),
            Err(err) => Err(self.abort(err.with_table(table))),
        }
    }

    /// Undo the current transaction after a failed operation
    ///
    /// I/O-class errors also close the connection.
    fn abort(&mut self, err: ExError) -> ExError {
        self.batch.reset();
        if let Some(conn) = self.conn.as_mut() {
            if let Err(rollback_err) = conn.rollback() {
                warn!(error = %rollback_err, "rollback after failure did not complete");
            }
        }
        if err.is_io() {
            if let Some(conn) = self.conn.take() {
                if let Err(close_err) = conn.close() {
                    warn!(error = %close_err, "closing connection after failure did not complete");
                }
                warn!(err_code = err.code(), "connection closed after I/O failure");
            }
        }
        err
    }
}

/// True when the sink asks to stop; checked between tables only
fn cancelled(status: &mut dyn StatusSink) -> bool {
    status.check_for_cancellation().is_err()
}
