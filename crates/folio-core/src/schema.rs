//! Schema registration and reference resolution
//!
//! Registration is two-phase. Every table is declared first; `build` then
//! binds each reference column to its target's slot in the table arena and
//! checks that the registration order is a valid dependency order.

use crate::column::ColumnKind;
use crate::dialect::{Dialect, DriverKind};
use crate::errors::{ExError, ExErrorKind, FolioError, Result};
use crate::table::{TableBuilder, TableDef, TableId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct SchemaBuilder {
    dialect: Arc<dyn Dialect>,
    tables: Vec<TableBuilder>,
}

impl SchemaBuilder {
    pub fn new(driver: DriverKind) -> Self {
        Self::with_dialect(driver.dialect())
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
        }
    }

    /// Register a table; parents must be registered before their children
    pub fn table(mut self, table: TableBuilder) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut tables = Vec::with_capacity(self.tables.len());
        let mut by_name = HashMap::new();
        for (slot, builder) in self.tables.into_iter().enumerate() {
            let table = builder.build(Arc::clone(&self.dialect))?;
            if by_name.insert(table.name().to_string(), TableId(slot)).is_some() {
                return Err(FolioError::DuplicateTable {
                    table: table.name().to_string(),
                }
                .into());
            }
            tables.push(table);
        }

        for slot in 0..tables.len() {
            resolve_references(&mut tables, &by_name, slot)?;
        }
        for table in &tables {
            check_key_columns(&tables, &by_name, table)?;
        }

        let load_strings = tables
            .iter()
            .map(|t| t.load_string(&tables))
            .collect::<Result<Vec<_>>>()?;

        Ok(Schema {
            tables,
            by_name,
            load_strings,
            dialect: self.dialect,
        })
    }
}

fn resolve_references(
    tables: &mut [TableDef],
    by_name: &HashMap<String, TableId>,
    slot: usize,
) -> Result<()> {
    let table_name = tables[slot].name().to_string();
    for column in tables[slot].columns_mut() {
        let ColumnKind::Reference(reference) = &mut column.kind else {
            continue;
        };
        let target = by_name.get(&reference.name).copied().ok_or_else(|| {
            FolioError::UnresolvedReference {
                table: table_name.clone(),
                column: column.name.clone(),
                target: reference.name.clone(),
            }
        })?;
        if target.index() >= slot {
            return Err(FolioError::DependencyOrder {
                table: table_name,
                column: column.name.clone(),
                target: reference.name.clone(),
            }
            .into());
        }
        reference.target = Some(target);
    }
    Ok(())
}

fn check_key_columns(
    tables: &[TableDef],
    by_name: &HashMap<String, TableId>,
    table: &TableDef,
) -> Result<()> {
    for column in table.columns() {
        let Some(spec) = column.encrypted() else {
            continue;
        };
        let target = table
            .column(&spec.key_column)
            .and_then(|c| c.reference())
            .and_then(|r| by_name.get(&r.name))
            .map(|id| &tables[id.index()]);
        match target {
            Some(key_table) if key_table.is_key_set() => {}
            _ => {
                return Err(ExError::new(ExErrorKind::InvalidSchema)
                    .with_table(table.name())
                    .with_column(column.name.clone())
                    .with_message(format!(
                        "key column {} does not reference a key-set table",
                        spec.key_column
                    )))
            }
        }
    }
    Ok(())
}

/// A resolved, dependency-ordered set of table definitions
#[derive(Debug)]
pub struct Schema {
    tables: Vec<TableDef>,
    by_name: HashMap<String, TableId>,
    load_strings: Vec<String>,
    dialect: Arc<dyn Dialect>,
}

impl Schema {
    /// Tables in registration (dependency) order
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.by_name.get(name).copied().ok_or_else(|| {
            FolioError::UnknownTable {
                table: name.to_string(),
            }
            .into()
        })
    }

    pub fn table(&self, name: &str) -> Result<&TableDef> {
        self.table_id(name).map(|id| &self.tables[id.index()])
    }

    pub fn get(&self, id: TableId) -> Option<&TableDef> {
        self.tables.get(id.index())
    }

    /// Load statement of `name`, planned when the schema was built
    pub fn load_string(&self, name: &str) -> Result<&str> {
        self.table_id(name).map(|id| self.load_strings[id.index()].as_str())
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn driver(&self) -> DriverKind {
        self.dialect.driver()
    }

    pub fn has_encrypted_columns(&self) -> bool {
        self.tables.iter().any(TableDef::has_encrypted_columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{PlainFormat, SortOrder};

    #[test]
    fn test_references_bind_to_arena_slots() {
        let schema = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("parent").string("name", 10))
            .table(TableBuilder::new("child").reference("parent", "parent"))
            .build()
            .unwrap();
        let column = schema.table("child").unwrap().column("parent").unwrap();
        assert_eq!(column.reference().unwrap().target, Some(schema.table_id("parent").unwrap()));
    }

    #[test]
    fn test_unresolved_reference() {
        let err = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("child").reference("parent", "parent"))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnresolvedReference);
        assert!(err.is_logic());
    }

    #[test]
    fn test_forward_reference_violates_dependency_order() {
        let err = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("child").reference("parent", "parent"))
            .table(TableBuilder::new("parent").string("name", 10))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DependencyOrder);
        assert_eq!(err.table(), Some("child"));
    }

    #[test]
    fn test_self_reference_violates_dependency_order() {
        let err = SchemaBuilder::new(DriverKind::Sqlite)
            .table(
                TableBuilder::new("node")
                    .reference("up", "node")
                    .nullable()
                    .sort(SortOrder::Ascending),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DependencyOrder);
    }

    #[test]
    fn test_duplicate_table() {
        let err = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("t"))
            .table(TableBuilder::new("t"))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DuplicateTable);
    }

    #[test]
    fn test_encrypted_column_needs_key_set_table() {
        let err = SchemaBuilder::new(DriverKind::Sqlite)
            .table(TableBuilder::new("plain").binary("material", 64))
            .table(
                TableBuilder::new("secret")
                    .reference("keys", "plain")
                    .encrypted("pin", PlainFormat::Text, 8, "keys"),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidSchema);
        assert_eq!(err.column(), Some("pin"));
    }

    #[test]
    fn test_unknown_table_lookup() {
        let schema = SchemaBuilder::new(DriverKind::Mysql).build().unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.table("x").unwrap_err().kind(), ExErrorKind::UnknownTable);
        assert_eq!(schema.driver(), DriverKind::Mysql);
    }
}
