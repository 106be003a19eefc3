//! Native values and per-row value maps
//!
//! A `RowValues` map is built fresh for every row crossing the store
//! boundary. A field that is absent from the map was never set on this pass;
//! a field mapped to `Value::Null` was explicitly cleared.

use crate::errors::{FolioError, Result};
use crate::table::ID_COLUMN;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-assigned row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub i64);

impl RowId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A native typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i32),
    Long(i64),
    Boolean(bool),
    Date(NaiveDate),
    Text(String),
    Binary(Vec<u8>),
    Decimal(Decimal),
    /// Identifier of a row, either this row's own or a referenced one
    Id(RowId),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Text(_) => "string",
            Value::Binary(_) => "binary",
            Value::Decimal(_) => "decimal",
            Value::Id(_) => "id",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<RowId> for Value {
    fn from(v: RowId) -> Self {
        Value::Id(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Field identity → value for one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowValues {
    values: BTreeMap<String, Value>,
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(&self, field: &str) -> Result<Option<$ty>> {
            match self.values.get(field) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::$variant(v)) => Ok(Some(v.clone())),
                Some(other) => Err(mismatch(field, $expected, other)),
            }
        }
    };
}

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// A row keyed by an existing identifier (for updates)
    pub fn with_id(id: RowId) -> Self {
        let mut row = Self::new();
        row.set(ID_COLUMN, id);
        row
    }

    /// Builder form of `set`
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Forget a field so the next update leaves its column untouched
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The row's own identifier, if present
    pub fn id(&self) -> Option<RowId> {
        match self.values.get(ID_COLUMN) {
            Some(Value::Id(id)) => Some(*id),
            _ => None,
        }
    }

    typed_accessor!(integer, Integer, i32, "integer");
    typed_accessor!(long, Long, i64, "long");
    typed_accessor!(boolean, Boolean, bool, "boolean");
    typed_accessor!(date, Date, NaiveDate, "date");
    typed_accessor!(
        /// Text value; `None` when unset or null
        text, Text, String, "string"
    );
    typed_accessor!(binary, Binary, Vec<u8>, "binary");
    typed_accessor!(
        /// Value of any of the fixed-precision decimal kinds
        decimal, Decimal, Decimal, "decimal"
    );
    typed_accessor!(
        /// Identifier held by a reference column
        reference, Id, RowId, "id"
    );
}

fn mismatch(field: &str, expected: &str, found: &Value) -> crate::errors::ExError {
    FolioError::TypeMismatch {
        column: field.to_string(),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use std::str::FromStr;

    #[test]
    fn test_unset_and_null_read_as_none() {
        let row = RowValues::new().with("name", Value::Null);
        assert_eq!(row.text("name").unwrap(), None);
        assert_eq!(row.text("missing").unwrap(), None);
        assert!(row.is_set("name"));
        assert!(!row.is_set("missing"));
    }

    #[test]
    fn test_mismatched_accessor_is_type_mismatch() {
        let row = RowValues::new().with("price", Decimal::from_str("1.25").unwrap());
        let err = row.text("price").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::TypeMismatch);
        assert!(err.is_logic());
    }

    #[test]
    fn test_option_converts_to_null() {
        let row = RowValues::new().with("memo", None::<String>);
        assert_eq!(row.get("memo"), Some(&Value::Null));
    }

    #[test]
    fn test_with_id_sets_identifier() {
        let row = RowValues::with_id(RowId(7));
        assert_eq!(row.id(), Some(RowId(7)));
        assert_eq!(row.reference(ID_COLUMN).unwrap(), Some(RowId(7)));
    }
}
