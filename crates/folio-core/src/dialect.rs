//! SQL dialect strategies
//!
//! Each supported driver gets one `Dialect` implementation, injected into
//! every table definition of a schema. Identifiers are always double-quoted.

use crate::column::{ColumnKind, DecimalKind};
use crate::errors::{ExError, ExErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Driver identity, as named in store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Sqlite,
    Postgres,
    Mysql,
}

impl DriverKind {
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        match self {
            DriverKind::Sqlite => Arc::new(SqliteDialect),
            DriverKind::Postgres => Arc::new(PostgresDialect),
            DriverKind::Mysql => Arc::new(MySqlDialect),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Sqlite => "sqlite",
            DriverKind::Postgres => "postgres",
            DriverKind::Mysql => "mysql",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DriverKind {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DriverKind::Sqlite),
            "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            "mysql" => Ok(DriverKind::Mysql),
            other => Err(ExError::new(ExErrorKind::UnsupportedDriver)
                .with_message(format!("Unknown driver: {}", other))),
        }
    }
}

pub trait Dialect: fmt::Debug + Send + Sync {
    fn driver(&self) -> DriverKind;

    /// Full column definition of the synthetic identifier, minus its name
    fn identifier_type(&self) -> &'static str;

    /// Type fragment of a column in `create table`
    fn column_type(&self, kind: &ColumnKind) -> String;

    fn drop_table(&self, table: &str) -> String {
        format!("drop table if exists {}", quote(table))
    }

    /// Explicit index drop, for dialects that do not drop indexes with tables
    fn drop_index(&self, _table: &str, _index: &str) -> Option<String> {
        None
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn decimal_type(kind: DecimalKind) -> String {
    format!("numeric({},{})", kind.precision(), kind.scale())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn driver(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn identifier_type(&self) -> &'static str {
        "integer primary key autoincrement"
    }

    fn column_type(&self, kind: &ColumnKind) -> String {
        match kind {
            ColumnKind::Identifier | ColumnKind::Integer => "integer".to_string(),
            ColumnKind::Long | ColumnKind::Reference(_) => "bigint".to_string(),
            ColumnKind::Boolean => "boolean".to_string(),
            ColumnKind::Date => "date".to_string(),
            ColumnKind::String { length } => format!("varchar({})", length),
            ColumnKind::Binary { .. } | ColumnKind::Encrypted(_) => "blob".to_string(),
            // Text affinity keeps the fixed-scale string form byte-for-byte;
            // numeric affinity would fold it into a float.
            ColumnKind::Decimal(kind) => format!("varchar({})", kind.precision() + 2),
        }
    }

    fn drop_index(&self, _table: &str, index: &str) -> Option<String> {
        Some(format!("drop index if exists {}", quote(index)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn driver(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn identifier_type(&self) -> &'static str {
        "bigserial primary key"
    }

    fn column_type(&self, kind: &ColumnKind) -> String {
        match kind {
            ColumnKind::Identifier | ColumnKind::Long | ColumnKind::Reference(_) => {
                "bigint".to_string()
            }
            ColumnKind::Integer => "integer".to_string(),
            ColumnKind::Boolean => "boolean".to_string(),
            ColumnKind::Date => "date".to_string(),
            ColumnKind::String { length } => format!("varchar({})", length),
            ColumnKind::Binary { .. } | ColumnKind::Encrypted(_) => "bytea".to_string(),
            ColumnKind::Decimal(kind) => decimal_type(*kind),
        }
    }

    fn drop_table(&self, table: &str) -> String {
        format!("drop table if exists {} cascade", quote(table))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn driver(&self) -> DriverKind {
        DriverKind::Mysql
    }

    fn identifier_type(&self) -> &'static str {
        "bigint auto_increment primary key"
    }

    fn column_type(&self, kind: &ColumnKind) -> String {
        match kind {
            ColumnKind::Identifier | ColumnKind::Long | ColumnKind::Reference(_) => {
                "bigint".to_string()
            }
            ColumnKind::Integer => "int".to_string(),
            ColumnKind::Boolean => "tinyint(1)".to_string(),
            ColumnKind::Date => "date".to_string(),
            ColumnKind::String { length } => format!("varchar({})", length),
            ColumnKind::Binary { length } => format!("varbinary({})", length),
            ColumnKind::Encrypted(spec) => format!("varbinary({})", spec.stored_length()),
            ColumnKind::Decimal(kind) => decimal_type(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_types_split_standard_and_extended() {
        let pg = PostgresDialect;
        assert_eq!(pg.column_type(&ColumnKind::Decimal(DecimalKind::Money)), "numeric(19,4)");
        assert_eq!(pg.column_type(&ColumnKind::Decimal(DecimalKind::Ratio)), "numeric(22,6)");
        let sqlite = SqliteDialect;
        assert_eq!(sqlite.column_type(&ColumnKind::Decimal(DecimalKind::Price)), "varchar(21)");
    }

    #[test]
    fn test_drop_forms() {
        assert_eq!(SqliteDialect.drop_table("lot"), "drop table if exists \"lot\"");
        assert_eq!(PostgresDialect.drop_table("lot"), "drop table if exists \"lot\" cascade");
        assert_eq!(
            SqliteDialect.drop_index("lot", "lot_sort"),
            Some("drop index if exists \"lot_sort\"".to_string())
        );
        assert_eq!(MySqlDialect.drop_index("lot", "lot_sort"), None);
    }

    #[test]
    fn test_driver_parsing() {
        assert_eq!("SQLite".parse::<DriverKind>().unwrap(), DriverKind::Sqlite);
        assert_eq!("postgresql".parse::<DriverKind>().unwrap(), DriverKind::Postgres);
        let err = "oracle".parse::<DriverKind>().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnsupportedDriver);
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}
