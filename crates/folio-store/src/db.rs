//! Database connection management
//!
//! Opens and configures the single connection a data store owns. Only the
//! SQLite driver can be opened; the server dialects exist for DDL text.

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, Result};
use folio_core::dialect::DriverKind;
use folio_core::errors::{ExError, ExErrorKind};
use rusqlite::Connection;
use std::path::Path;

/// Open the database described by `config`
pub fn open_config(config: &StoreConfig) -> Result<Connection> {
    if config.driver != DriverKind::Sqlite {
        return Err(ExError::new(ExErrorKind::UnsupportedDriver)
            .with_op("open")
            .with_message(format!(
                "Driver {} has no live connection support",
                config.driver
            )));
    }
    let conn = if config.is_in_memory() {
        open_in_memory()?
    } else {
        open(&config.address)?
    };
    configure(&conn)?;
    Ok(conn)
}

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Enforce reference constraints on every connection
pub fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_config(&StoreConfig::in_memory()).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_server_driver_cannot_open() {
        let mut config = StoreConfig::in_memory();
        config.driver = DriverKind::Postgres;
        let err = open_config(&config).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnsupportedDriver);
    }
}
