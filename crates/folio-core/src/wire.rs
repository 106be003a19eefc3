//! Driver-facing wire representation
//!
//! `WireValue` is what crosses the driver boundary: one per column position,
//! identifier first. Absent values carry the null marker of their declared
//! kind so dialects that type their parameters can bind the right null.

use crate::errors::Result;

/// Typed null markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullKind {
    Numeric,
    Text,
    Date,
    Boolean,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null(NullKind),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl WireValue {
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Null(_) => "null",
            WireValue::Integer(_) => "integer",
            WireValue::Real(_) => "real",
            WireValue::Text(_) => "text",
            WireValue::Blob(_) => "blob",
        }
    }
}

/// A positioned result row as exposed by the driver
pub trait Cursor {
    /// Read the field at `position` (0-based, declaration order)
    fn read(&self, position: usize) -> Result<WireValue>;
}

/// Cursor over an already-materialized row, used by tests and replays
impl Cursor for [WireValue] {
    fn read(&self, position: usize) -> Result<WireValue> {
        self.get(position).cloned().ok_or_else(|| {
            crate::errors::ExError::new(crate::errors::ExErrorKind::Internal)
                .with_message(format!("cursor has no position {}", position))
        })
    }
}

impl Cursor for Vec<WireValue> {
    fn read(&self, position: usize) -> Result<WireValue> {
        self.as_slice().read(position)
    }
}
