//! Error handling for folio-store
//!
//! Wraps folio-core ExError with store-specific helpers

use folio_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
///
/// A refused constraint is a logic error and leaves the connection usable;
/// everything else the driver reports is treated as connection trouble.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ExErrorKind::ConstraintViolation
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind).with_op("sqlite").with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a configuration error
pub fn config_error(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("config_load")
        .with_message(reason.to_string())
}

/// Create a manifest validation error
pub fn manifest_error(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidSchema)
        .with_op("manifest_parse")
        .with_message(reason.to_string())
}

/// Create a closed-store error for `operation`
pub fn store_closed(operation: &str) -> ExError {
    ExError::new(ExErrorKind::StoreClosed)
        .with_op(operation.to_string())
        .with_message("Data store is closed; reopen it first")
}

/// Create a decryption error for a payload of `column`
pub fn decryption_error(column: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Decryption)
        .with_column(column.to_string())
        .with_message(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_constraint_failure_is_logic_class() {
        let err = from_rusqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            Some("FOREIGN KEY constraint failed".to_string()),
        ));
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
        assert!(err.is_logic());
    }

    #[test]
    fn test_other_driver_failure_is_io_class() {
        let err = from_rusqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_ERROR),
            Some("no such table: B".to_string()),
        ));
        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert!(err.is_io());
        assert!(err.message().contains("no such table"));
    }
}
