//! Table Definition
//!
//! An ordered list of column codecs for one record type. The identifier
//! column is always first and is added by the builder; every other column
//! is declared through the typed registration methods.

mod joins;
mod rows;
mod statements;

pub use rows::EncodedUpdate;

use crate::cipher::CipherSuite;
use crate::column::{
    ColumnDef, ColumnKind, DecimalKind, EncryptedSpec, PlainFormat, SortOrder, TableRef,
};
use crate::dialect::Dialect;
use crate::errors::{ExError, ExErrorKind, FolioError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the synthetic identifier column
pub const ID_COLUMN: &str = "id";

/// Slot of a table in its schema's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

impl TableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
    positions: HashMap<String, usize>,
    sort_list: Vec<usize>,
    sort_has_reference: bool,
    key_material: Option<usize>,
    dialect: Arc<dyn Dialect>,
}

impl TableDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order, identifier first
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.positions.get(name).map(|&i| &self.columns[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Columns with a sort order, in declaration order
    pub fn sort_list(&self) -> impl Iterator<Item = &ColumnDef> {
        self.sort_list.iter().map(|&i| &self.columns[i])
    }

    /// True when loading must join referenced tables to order rows
    pub fn sort_has_reference(&self) -> bool {
        self.sort_has_reference
    }

    /// Column holding wrapped key material, for key-set tables
    pub fn key_material_column(&self) -> Option<&ColumnDef> {
        self.key_material.map(|i| &self.columns[i])
    }

    pub fn is_key_set(&self) -> bool {
        self.key_material.is_some()
    }

    pub fn has_encrypted_columns(&self) -> bool {
        self.columns.iter().any(|c| c.encrypted().is_some())
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [ColumnDef] {
        &mut self.columns
    }
}

/// Declares one table's columns
///
/// Registration errors (duplicate names, modifiers with no column) are
/// collected and reported by `build`, so declarations can be chained.
///
/// ```
/// use folio_core::column::{DecimalKind, SortOrder};
/// use folio_core::table::TableBuilder;
///
/// let lots = TableBuilder::new("lot")
///     .reference("security", "security")
///     .sort(SortOrder::Ascending)
///     .date("acquired")
///     .sort(SortOrder::Descending)
///     .decimal("units", DecimalKind::Units)
///     .decimal("cost", DecimalKind::Money)
///     .nullable();
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDef>,
    key_material: Option<String>,
    error: Option<ExError>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![ColumnDef::new(ID_COLUMN, ColumnKind::Identifier)],
            key_material: None,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a column of any kind
    pub fn column(mut self, name: &str, kind: ColumnKind) -> Self {
        if self.columns.iter().any(|c| c.name == name) {
            self.fail(
                FolioError::DuplicateColumn {
                    table: self.name.clone(),
                    column: name.to_string(),
                }
                .into(),
            );
        } else {
            self.columns.push(ColumnDef::new(name, kind));
        }
        self
    }

    pub fn integer(self, name: &str) -> Self {
        self.column(name, ColumnKind::Integer)
    }

    pub fn long(self, name: &str) -> Self {
        self.column(name, ColumnKind::Long)
    }

    pub fn boolean(self, name: &str) -> Self {
        self.column(name, ColumnKind::Boolean)
    }

    pub fn date(self, name: &str) -> Self {
        self.column(name, ColumnKind::Date)
    }

    pub fn string(self, name: &str, length: u32) -> Self {
        self.column(name, ColumnKind::String { length })
    }

    pub fn binary(self, name: &str, length: u32) -> Self {
        self.column(name, ColumnKind::Binary { length })
    }

    pub fn decimal(self, name: &str, kind: DecimalKind) -> Self {
        self.column(name, ColumnKind::Decimal(kind))
    }

    /// Foreign key to the identifier of `table`
    pub fn reference(self, name: &str, table: &str) -> Self {
        self.column(name, ColumnKind::Reference(TableRef::unresolved(table)))
    }

    /// Encrypted payload protected by the key set named in `key_column`
    pub fn encrypted(
        self,
        name: &str,
        plain: PlainFormat,
        plain_length: u32,
        key_column: &str,
    ) -> Self {
        self.column(
            name,
            ColumnKind::Encrypted(EncryptedSpec {
                plain,
                plain_length,
                key_column: key_column.to_string(),
                suite: CipherSuite::Aes256Gcm,
            }),
        )
    }

    /// Mark the last registered column nullable
    pub fn nullable(mut self) -> Self {
        match self.last_declared() {
            Some(column) => column.nullable = true,
            None => self.fail(self.modifier_error("nullable")),
        }
        self
    }

    /// Add the last registered column to the sort list
    pub fn sort(mut self, order: SortOrder) -> Self {
        match self.last_declared() {
            Some(column) => column.sort = Some(order),
            None => self.fail(self.modifier_error("sort")),
        }
        self
    }

    /// Designate this table as a key-set table whose wrapped key lives in
    /// the binary column `material`
    pub fn key_set(mut self, material: &str) -> Self {
        self.key_material = Some(material.to_string());
        self
    }

    fn last_declared(&mut self) -> Option<&mut ColumnDef> {
        if self.columns.len() > 1 {
            self.columns.last_mut()
        } else {
            None
        }
    }

    fn modifier_error(&self, modifier: &str) -> ExError {
        ExError::new(ExErrorKind::InvalidSchema)
            .with_table(self.name.clone())
            .with_message(format!("'{}' applied before any column was declared", modifier))
    }

    fn fail(&mut self, err: ExError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub(crate) fn build(self, dialect: Arc<dyn Dialect>) -> Result<TableDef> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.name.is_empty() {
            return Err(ExError::new(ExErrorKind::InvalidSchema)
                .with_message("table name must not be empty"));
        }

        let positions: HashMap<String, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        let sort_list: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.sort.is_some())
            .map(|(i, _)| i)
            .collect();
        let sort_has_reference = sort_list.iter().any(|&i| self.columns[i].kind.is_reference());

        let key_material = match &self.key_material {
            None => None,
            Some(material) => {
                let position = positions.get(material).copied().ok_or_else(|| {
                    ExError::from(FolioError::UnknownColumn {
                        table: self.name.clone(),
                        column: material.clone(),
                    })
                })?;
                if !matches!(self.columns[position].kind, ColumnKind::Binary { .. }) {
                    return Err(ExError::new(ExErrorKind::InvalidSchema)
                        .with_table(self.name.clone())
                        .with_column(material.clone())
                        .with_message("key material column must be binary"));
                }
                Some(position)
            }
        };

        for column in &self.columns {
            if let Some(spec) = column.encrypted() {
                let key_column = positions
                    .get(&spec.key_column)
                    .map(|&i| &self.columns[i])
                    .ok_or_else(|| {
                        ExError::from(FolioError::UnknownColumn {
                            table: self.name.clone(),
                            column: spec.key_column.clone(),
                        })
                    })?;
                if !key_column.kind.is_reference() {
                    return Err(ExError::new(ExErrorKind::InvalidSchema)
                        .with_table(self.name.clone())
                        .with_column(column.name.clone())
                        .with_message(format!(
                            "key column {} must be a reference to a key-set table",
                            spec.key_column
                        )));
                }
                if column.sort.is_some() {
                    return Err(ExError::new(ExErrorKind::InvalidSchema)
                        .with_table(self.name.clone())
                        .with_column(column.name.clone())
                        .with_message("encrypted columns cannot be sorted"));
                }
            }
        }

        Ok(TableDef {
            name: self.name,
            columns: self.columns,
            positions,
            sort_list,
            sort_has_reference,
            key_material,
            dialect,
        })
    }
}
