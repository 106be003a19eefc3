//! Manifest Format v0
//!
//! ```yaml
//! schema_version: 0
//! tables:
//!   - name: security
//!     columns:
//!       - { name: symbol, kind: string, length: 12, sort: ascending }
//!   - name: lot
//!     columns:
//!       - { name: security, kind: reference, references: security, sort: ascending }
//!       - { name: units, kind: units }
//! ```

use folio_core::column::{DecimalKind, PlainFormat, SortOrder};
use serde::{Deserialize, Serialize};

/// Top-level manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Tables in dependency order, parents first
    pub tables: Vec<ManifestTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestTable {
    pub name: String,

    /// Columns after the implicit identifier
    #[serde(default)]
    pub columns: Vec<ManifestColumn>,

    /// Present on key-set tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_set: Option<ManifestKeySet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestKeySet {
    /// Binary column holding the wrapped data key
    pub material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestColumn {
    pub name: String,

    pub kind: ManifestKind,

    /// Required for string, binary and encrypted columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,

    /// Target table of a reference column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,

    /// Plaintext type of an encrypted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain: Option<ManifestPlain>,

    /// Reference column naming the key set of an encrypted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    Integer,
    Long,
    Boolean,
    Date,
    String,
    Binary,
    Money,
    Rate,
    Price,
    Units,
    Ratio,
    Dilution,
    Reference,
    Encrypted,
}

impl ManifestKind {
    pub fn decimal(&self) -> Option<DecimalKind> {
        match self {
            ManifestKind::Money => Some(DecimalKind::Money),
            ManifestKind::Rate => Some(DecimalKind::Rate),
            ManifestKind::Price => Some(DecimalKind::Price),
            ManifestKind::Units => Some(DecimalKind::Units),
            ManifestKind::Ratio => Some(DecimalKind::Ratio),
            ManifestKind::Dilution => Some(DecimalKind::Dilution),
            _ => None,
        }
    }
}

/// Flat spelling of `PlainFormat`; decimal kinds are named directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestPlain {
    Integer,
    Long,
    Boolean,
    Date,
    Text,
    Money,
    Rate,
    Price,
    Units,
    Ratio,
    Dilution,
}

impl From<ManifestPlain> for PlainFormat {
    fn from(plain: ManifestPlain) -> Self {
        match plain {
            ManifestPlain::Integer => PlainFormat::Integer,
            ManifestPlain::Long => PlainFormat::Long,
            ManifestPlain::Boolean => PlainFormat::Boolean,
            ManifestPlain::Date => PlainFormat::Date,
            ManifestPlain::Text => PlainFormat::Text,
            ManifestPlain::Money => PlainFormat::Decimal(DecimalKind::Money),
            ManifestPlain::Rate => PlainFormat::Decimal(DecimalKind::Rate),
            ManifestPlain::Price => PlainFormat::Decimal(DecimalKind::Price),
            ManifestPlain::Units => PlainFormat::Decimal(DecimalKind::Units),
            ManifestPlain::Ratio => PlainFormat::Decimal(DecimalKind::Ratio),
            ManifestPlain::Dilution => PlainFormat::Decimal(DecimalKind::Dilution),
        }
    }
}
