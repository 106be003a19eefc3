//! Column Codec family
//!
//! A `ColumnDef` pairs a stable field identity with a closed `ColumnKind`.
//! Every codec operation matches exhaustively on the kind, so a new kind
//! cannot be added without deciding how it encodes, decodes, nulls and
//! declares itself.

mod codec;
pub mod encrypted;

use crate::cipher::CipherSuite;
use crate::table::TableId;
use crate::wire::NullKind;
use serde::{Deserialize, Serialize};

/// Fixed-precision decimal kinds
///
/// All are persisted as string-encoded decimals. The standard kinds carry
/// four fractional digits, the extended kinds six. A value with more
/// significant fractional digits than its kind carries is refused on store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalKind {
    Money,
    Rate,
    Price,
    Units,
    Ratio,
    Dilution,
}

impl DecimalKind {
    pub fn scale(&self) -> u32 {
        if self.is_extended() {
            6
        } else {
            4
        }
    }

    /// Total significant digits
    pub fn precision(&self) -> u32 {
        if self.is_extended() {
            22
        } else {
            19
        }
    }

    pub fn is_extended(&self) -> bool {
        match self {
            DecimalKind::Money | DecimalKind::Rate | DecimalKind::Price | DecimalKind::Units => {
                false
            }
            DecimalKind::Ratio | DecimalKind::Dilution => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecimalKind::Money => "money",
            DecimalKind::Rate => "rate",
            DecimalKind::Price => "price",
            DecimalKind::Units => "units",
            DecimalKind::Ratio => "ratio",
            DecimalKind::Dilution => "dilution",
        }
    }
}

/// Higher-level type carried inside an encrypted payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlainFormat {
    Integer,
    Long,
    Boolean,
    Date,
    Text,
    Decimal(DecimalKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Descending)
    }

    /// Direction of a key reached through a reference sorted in `self` order
    pub fn compose(self, inner: SortOrder) -> SortOrder {
        if self.is_descending() == inner.is_descending() {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// Name of a referenced table, bound to its arena slot by resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub target: Option<TableId>,
}

impl TableRef {
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }
}

/// Declaration of an encrypted column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSpec {
    pub plain: PlainFormat,
    /// Maximum plaintext length in bytes
    pub plain_length: u32,
    /// Reference column on the same row naming the protecting key set
    pub key_column: String,
    pub suite: CipherSuite,
}

impl EncryptedSpec {
    /// Declared binary length: plaintext plus cipher overhead, capped at `u32::MAX`
    pub fn stored_length(&self) -> u32 {
        self.plain_length.saturating_add(self.suite.overhead())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Synthetic auto-assigned primary key
    Identifier,
    Integer,
    Long,
    Boolean,
    Date,
    String { length: u32 },
    Binary { length: u32 },
    Decimal(DecimalKind),
    Reference(TableRef),
    Encrypted(EncryptedSpec),
}

impl ColumnKind {
    pub fn null_kind(&self) -> NullKind {
        match self {
            ColumnKind::Identifier
            | ColumnKind::Integer
            | ColumnKind::Long
            | ColumnKind::Decimal(_)
            | ColumnKind::Reference(_) => NullKind::Numeric,
            ColumnKind::Boolean => NullKind::Boolean,
            ColumnKind::Date => NullKind::Date,
            ColumnKind::String { .. } => NullKind::Text,
            ColumnKind::Binary { .. } | ColumnKind::Encrypted(_) => NullKind::Binary,
        }
    }

    /// Name of the native value type this kind exchanges
    pub fn value_type(&self) -> &'static str {
        match self {
            ColumnKind::Identifier | ColumnKind::Reference(_) => "id",
            ColumnKind::Integer => "integer",
            ColumnKind::Long => "long",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::String { .. } => "string",
            ColumnKind::Binary { .. } => "binary",
            ColumnKind::Decimal(_) => "decimal",
            ColumnKind::Encrypted(spec) => match spec.plain {
                PlainFormat::Integer => "integer",
                PlainFormat::Long => "long",
                PlainFormat::Boolean => "boolean",
                PlainFormat::Date => "date",
                PlainFormat::Text => "string",
                PlainFormat::Decimal(_) => "decimal",
            },
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, ColumnKind::Reference(_))
    }
}

/// One column of a table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub sort: Option<SortOrder>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            sort: None,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, ColumnKind::Identifier)
    }

    /// The referenced table, for reference columns
    pub fn reference(&self) -> Option<&TableRef> {
        match &self.kind {
            ColumnKind::Reference(table_ref) => Some(table_ref),
            _ => None,
        }
    }

    pub fn encrypted(&self) -> Option<&EncryptedSpec> {
        match &self.kind {
            ColumnKind::Encrypted(spec) => Some(spec),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_scales() {
        assert_eq!(DecimalKind::Money.scale(), 4);
        assert_eq!(DecimalKind::Units.scale(), 4);
        assert_eq!(DecimalKind::Ratio.scale(), 6);
        assert_eq!(DecimalKind::Dilution.scale(), 6);
    }

    #[test]
    fn test_null_kinds_differ_by_kind() {
        assert_eq!(ColumnKind::Decimal(DecimalKind::Price).null_kind(), NullKind::Numeric);
        assert_eq!(ColumnKind::String { length: 10 }.null_kind(), NullKind::Text);
        assert_eq!(ColumnKind::Date.null_kind(), NullKind::Date);
        assert_eq!(ColumnKind::Boolean.null_kind(), NullKind::Boolean);
    }

    #[test]
    fn test_sort_order_composition() {
        use SortOrder::*;
        assert_eq!(Ascending.compose(Ascending), Ascending);
        assert_eq!(Descending.compose(Ascending), Descending);
        assert_eq!(Ascending.compose(Descending), Descending);
        assert_eq!(Descending.compose(Descending), Ascending);
    }

    #[test]
    fn test_encrypted_length_includes_overhead() {
        let spec = EncryptedSpec {
            plain: PlainFormat::Text,
            plain_length: 40,
            key_column: "key_set".to_string(),
            suite: CipherSuite::Aes256Gcm,
        };
        assert_eq!(spec.stored_length(), 40 + CipherSuite::Aes256Gcm.overhead());
    }

    #[test]
    fn test_stored_length_saturates() {
        let spec = EncryptedSpec {
            plain: PlainFormat::Text,
            plain_length: u32::MAX - 3,
            key_column: "key_set".to_string(),
            suite: CipherSuite::Aes256Gcm,
        };
        assert_eq!(spec.stored_length(), u32::MAX);
    }
}
