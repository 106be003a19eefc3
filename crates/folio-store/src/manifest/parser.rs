//! Manifest parser with validation
//!
//! Parses YAML, checks the schema version and per-kind attributes, then
//! resolves the table list into a `Schema`. Reference and dependency-order
//! checks are left to schema resolution.

use crate::errors::{io_error, manifest_error, Result};
use crate::manifest::format_v0::{ManifestColumn, ManifestKind, ManifestTable, ManifestV0};
use folio_core::cipher::CipherSuite;
use folio_core::dialect::DriverKind;
use folio_core::table::TableBuilder;
use folio_core::{Schema, SchemaBuilder};
use std::fs;
use std::path::Path;

/// Parse a manifest file from a path
pub fn parse_manifest_file(path: &Path) -> Result<ManifestV0> {
    let content = fs::read_to_string(path).map_err(|e| io_error("manifest_read", e))?;
    parse_manifest_str(&content)
}

/// Parse a manifest from a string
pub fn parse_manifest_str(content: &str) -> Result<ManifestV0> {
    let manifest: ManifestV0 = serde_yaml::from_str(content)
        .map_err(|e| manifest_error(&format!("YAML parse error: {}", e)))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Read, validate and resolve a manifest file for `driver`
pub fn load_schema(path: &Path, driver: DriverKind) -> Result<Schema> {
    parse_manifest_file(path)?.into_schema(driver)
}

fn validate_manifest(manifest: &ManifestV0) -> Result<()> {
    if manifest.schema_version != 0 {
        return Err(manifest_error(&format!(
            "Unsupported schema_version: {}. Expected 0",
            manifest.schema_version
        )));
    }
    for table in &manifest.tables {
        for column in &table.columns {
            validate_column(table, column)?;
        }
    }
    Ok(())
}

fn validate_column(table: &ManifestTable, column: &ManifestColumn) -> Result<()> {
    let at = format!("{}.{}", table.name, column.name);
    let needs_length = matches!(
        column.kind,
        ManifestKind::String | ManifestKind::Binary | ManifestKind::Encrypted
    );
    if needs_length && column.length.is_none() {
        return Err(manifest_error(&format!("Column {} needs a length", at)));
    }
    if !needs_length && column.length.is_some() {
        return Err(manifest_error(&format!("Column {} does not take a length", at)));
    }
    if (column.kind == ManifestKind::Reference) != column.references.is_some() {
        return Err(manifest_error(&format!(
            "Column {}: 'references' is required on reference columns and only there",
            at
        )));
    }
    let is_encrypted = column.kind == ManifestKind::Encrypted;
    if is_encrypted && (column.plain.is_none() || column.key_column.is_none()) {
        return Err(manifest_error(&format!(
            "Encrypted column {} needs 'plain' and 'key_column'",
            at
        )));
    }
    if let (true, Some(length)) = (is_encrypted, column.length) {
        if length.checked_add(CipherSuite::Aes256Gcm.overhead()).is_none() {
            return Err(manifest_error(&format!(
                "Encrypted column {} length {} leaves no room for cipher overhead",
                at, length
            )));
        }
    }
    if !is_encrypted && (column.plain.is_some() || column.key_column.is_some()) {
        return Err(manifest_error(&format!(
            "Column {}: 'plain' and 'key_column' apply to encrypted columns only",
            at
        )));
    }
    Ok(())
}

fn declare_column(builder: TableBuilder, column: &ManifestColumn) -> Result<TableBuilder> {
    let name = column.name.as_str();
    let length = column.length.unwrap_or_default();
    let builder = match column.kind {
        ManifestKind::Integer => builder.integer(name),
        ManifestKind::Long => builder.long(name),
        ManifestKind::Boolean => builder.boolean(name),
        ManifestKind::Date => builder.date(name),
        ManifestKind::String => builder.string(name, length),
        ManifestKind::Binary => builder.binary(name, length),
        ManifestKind::Reference => {
            let target = column
                .references
                .as_deref()
                .ok_or_else(|| manifest_error(&format!("Column {} has no target", name)))?;
            builder.reference(name, target)
        }
        ManifestKind::Encrypted => {
            let (Some(plain), Some(key_column)) = (column.plain, column.key_column.as_deref())
            else {
                return Err(manifest_error(&format!(
                    "Encrypted column {} is incomplete",
                    name
                )));
            };
            builder.encrypted(name, plain.into(), length, key_column)
        }
        decimal => match decimal.decimal() {
            Some(kind) => builder.decimal(name, kind),
            None => {
                return Err(manifest_error(&format!(
                    "Column {} has unsupported kind {:?}",
                    name, decimal
                )))
            }
        },
    };
    let builder = if column.nullable {
        builder.nullable()
    } else {
        builder
    };
    Ok(match column.sort {
        Some(order) => builder.sort(order),
        None => builder,
    })
}

impl ManifestV0 {
    /// Resolve into a schema whose statements target `driver`
    pub fn into_schema(self, driver: DriverKind) -> Result<Schema> {
        let mut schema = SchemaBuilder::new(driver);
        for table in &self.tables {
            let mut builder = TableBuilder::new(table.name.clone());
            for column in &table.columns {
                builder = declare_column(builder, column)?;
            }
            if let Some(key_set) = &table.key_set {
                builder = builder.key_set(&key_set.material);
            }
            schema = schema.table(builder);
        }
        schema.build()
    }
}
