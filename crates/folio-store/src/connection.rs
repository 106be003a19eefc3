//! The store's single connection
//!
//! Transactions are driven explicitly: the first write after a commit opens
//! one, and the data store decides when to commit or roll back. Every
//! commit, rollback and statement is counted so batching is observable.

use crate::config::StoreConfig;
use crate::db;
use crate::errors::{from_rusqlite, Result};
use folio_core::errors::{ExError, FolioError};
use folio_core::value::RowId;
use folio_core::wire::{Cursor, NullKind, WireValue};
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, Row, ToSql};

/// Statement parameter bound from a wire value
pub struct Param<'a>(pub &'a WireValue);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            WireValue::Null(_) => ToSqlOutput::Owned(SqlValue::Null),
            WireValue::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            WireValue::Real(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            WireValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            WireValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Positioned view of a result row
struct RowCursor<'a, 'stmt> {
    row: &'a Row<'stmt>,
}

impl Cursor for RowCursor<'_, '_> {
    fn read(&self, position: usize) -> folio_core::errors::Result<WireValue> {
        let value = self.row.get_ref(position).map_err(from_rusqlite)?;
        Ok(match value {
            ValueRef::Null => WireValue::Null(NullKind::Numeric),
            ValueRef::Integer(v) => WireValue::Integer(v),
            ValueRef::Real(v) => WireValue::Real(v),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    ExError::from(FolioError::MalformedValue {
                        column: format!("#{}", position),
                        reason: e.to_string(),
                    })
                })?;
                WireValue::Text(text.to_string())
            }
            ValueRef::Blob(bytes) => WireValue::Blob(bytes.to_vec()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub commits: u64,
    pub rollbacks: u64,
    pub statements: u64,
}

#[derive(Debug)]
pub struct StoreConnection {
    conn: Connection,
    in_transaction: bool,
    stats: ConnectionStats,
}

impl StoreConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
            stats: ConnectionStats::default(),
        }
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        db::open_config(config).map(Self::new)
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Open a transaction unless one is already running
    pub fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN").map_err(from_rusqlite)?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Commit the running transaction; false when there was none
    pub fn commit(&mut self) -> Result<bool> {
        if !self.in_transaction {
            return Ok(false);
        }
        self.conn.execute_batch("COMMIT").map_err(from_rusqlite)?;
        self.in_transaction = false;
        self.stats.commits += 1;
        Ok(true)
    }

    /// Discard the running transaction, if any
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.stats.rollbacks += 1;
        // SQLite may already have rolled back on its own after a failed statement
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK").map_err(from_rusqlite)
    }

    /// Run one write inside the current transaction
    pub fn execute(&mut self, sql: &str, params: &[WireValue]) -> Result<usize> {
        self.begin()?;
        self.stats.statements += 1;
        self.conn
            .execute(sql, rusqlite::params_from_iter(params.iter().map(Param)))
            .map_err(from_rusqlite)
    }

    /// Run an insert and return the identifier the database assigned
    pub fn insert(&mut self, sql: &str, params: &[WireValue]) -> Result<RowId> {
        self.execute(sql, params)?;
        Ok(RowId(self.conn.last_insert_rowid()))
    }

    /// Run a schema statement inside the current transaction
    pub fn execute_ddl(&mut self, sql: &str) -> Result<()> {
        self.execute(sql, &[]).map(|_| ())
    }

    /// Stream every row of `sql` through `visit`
    pub fn for_each_row<F>(&mut self, sql: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(&dyn Cursor) -> Result<()>,
    {
        self.stats.statements += 1;
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        let mut rows = stmt.query([]).map_err(from_rusqlite)?;
        while let Some(row) = rows.next().map_err(from_rusqlite)? {
            visit(&RowCursor { row })?;
        }
        Ok(())
    }

    pub fn count(&mut self, sql: &str) -> Result<i64> {
        self.stats.statements += 1;
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(from_rusqlite)
    }

    /// Roll back anything uncommitted and release the connection
    pub fn close(mut self) -> Result<()> {
        self.rollback()?;
        self.conn.close().map_err(|(_, e)| from_rusqlite(e))
    }

    /// Underlying connection, for inspection
    pub fn raw(&self) -> &Connection {
        &self.conn
    }
}
