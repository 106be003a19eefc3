//! Relational persistence core
//!
//! Column codecs, table definitions with dialect-aware statement text,
//! reference resolution with join/order planning, encrypted columns bound to
//! key-set rows, and the batch-commit counter the data store drives.

pub use folio_core_types as types;

pub mod batch;
pub mod cipher;
pub mod column;
pub mod dialect;
pub mod errors;
pub mod logging_facility;
pub mod records;
pub mod schema;
pub mod status;
pub mod table;
pub mod value;
pub mod wire;

pub use errors::{ErrorClass, ExError, ExErrorKind, FolioError, Result};
pub use schema::{Schema, SchemaBuilder};
pub use table::{TableBuilder, TableDef, ID_COLUMN};
pub use value::{RowId, RowValues, Value};
