//! Row-level encode/decode through a table's column codecs

use super::{TableDef, ID_COLUMN};
use crate::cipher::{RowCipher, SealContext};
use crate::column::{encrypted, ColumnDef, EncryptedSpec};
use crate::errors::{ExError, FolioError, Result};
use crate::value::{RowId, RowValues, Value};
use crate::wire::{Cursor, WireValue};

/// Parameters of an update statement built from a partial row
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedUpdate {
    pub id: RowId,
    /// Columns being written, in declaration order
    pub columns: Vec<String>,
    /// One value per column, followed by the identifier
    pub params: Vec<WireValue>,
}

impl EncodedUpdate {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

impl TableDef {
    /// Parameters for `insert_string`, in declaration order
    ///
    /// Nullable columns the row never set are written as null. A
    /// non-nullable column left unset is a defect.
    pub fn encode_insert(&self, row: &RowValues, cipher: &dyn RowCipher) -> Result<Vec<WireValue>> {
        self.check_fields(row)?;
        if let Some(id) = row.id() {
            return Err(FolioError::UnexpectedIdentifier {
                table: self.name().to_string(),
                row_id: id.get(),
            }
            .into());
        }

        let mut params = Vec::with_capacity(self.columns().len() - 1);
        for column in self.columns().iter().filter(|c| !c.is_identifier()) {
            let wire = match row.get(&column.name) {
                Some(value) => self.encode_column(column, value, row, cipher)?,
                None if column.nullable => WireValue::Null(column.kind.null_kind()),
                None => {
                    return Err(FolioError::UnsetColumn {
                        table: self.name().to_string(),
                        column: column.name.clone(),
                    }
                    .into())
                }
            };
            params.push(wire);
        }
        Ok(params)
    }

    /// Parameters for `update_string` covering only the fields set on `row`
    ///
    /// Returns `None` when the row carries nothing but its identifier.
    pub fn encode_update(
        &self,
        row: &RowValues,
        cipher: &dyn RowCipher,
    ) -> Result<Option<EncodedUpdate>> {
        self.check_fields(row)?;
        let id = row.id().ok_or_else(|| FolioError::MissingIdentifier {
            table: self.name().to_string(),
        })?;

        self.check_key_change(row)
            .map_err(|e| e.with_row_id(id.get()))?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for column in self.columns().iter().filter(|c| !c.is_identifier()) {
            if let Some(value) = row.get(&column.name) {
                let wire = self
                    .encode_column(column, value, row, cipher)
                    .map_err(|e| e.with_row_id(id.get()))?;
                columns.push(column.name.clone());
                params.push(wire);
            }
        }
        if columns.is_empty() {
            return Ok(None);
        }
        params.push(WireValue::Integer(id.get()));
        Ok(Some(EncodedUpdate { id, columns, params }))
    }

    /// Materialize one loaded row, one cursor position per column
    ///
    /// Encrypted payloads are opened once the row's key set is known.
    pub fn decode_row(&self, cursor: &dyn Cursor, cipher: &dyn RowCipher) -> Result<RowValues> {
        let mut row = RowValues::new();
        let mut sealed = Vec::new();

        for (position, column) in self.columns().iter().enumerate() {
            let value = column
                .load_value(cursor, position)
                .map_err(|e| self.row_error(e, &row))?;
            match (column.encrypted(), value) {
                (Some(spec), Value::Binary(payload)) => sealed.push((column, spec, payload)),
                (_, value) => {
                    row.set(&column.name, value);
                }
            }
        }

        for (column, spec, payload) in sealed {
            let value = self
                .open_column(column, spec, &payload, &row, cipher)
                .map_err(|e| self.row_error(e, &row))?;
            row.set(&column.name, value);
        }
        Ok(row)
    }

    /// Key-set id and wrapped key of a key-set row
    pub fn key_material(&self, row: &RowValues) -> Result<Option<(RowId, Vec<u8>)>> {
        let Some(material) = self.key_material_column() else {
            return Ok(None);
        };
        match (row.id(), row.binary(&material.name)?) {
            (Some(id), Some(bytes)) => Ok(Some((id, bytes))),
            _ => Ok(None),
        }
    }

    fn check_fields(&self, row: &RowValues) -> Result<()> {
        for field in row.fields() {
            let column = self.column(field).ok_or_else(|| FolioError::UnknownColumn {
                table: self.name().to_string(),
                column: field.to_string(),
            })?;
            if let Some(value) = row.get(field) {
                column.check_value(value).map_err(|e| e.with_table(self.name()))?;
            }
        }
        Ok(())
    }

    /// Every encrypted column keyed by a column the update moves must be
    /// resealed in the same update, or its stored payload stays bound to
    /// the previous key set.
    fn check_key_change(&self, row: &RowValues) -> Result<()> {
        for column in self.columns() {
            let Some(spec) = column.encrypted() else {
                continue;
            };
            if row.get(&spec.key_column).is_some() && row.get(&column.name).is_none() {
                return Err(FolioError::KeyChangeUnsealed {
                    table: self.name().to_string(),
                    key_column: spec.key_column.clone(),
                    column: column.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn encode_column(
        &self,
        column: &ColumnDef,
        value: &Value,
        row: &RowValues,
        cipher: &dyn RowCipher,
    ) -> Result<WireValue> {
        if value.is_null() {
            if !column.nullable {
                return Err(FolioError::NullViolation {
                    table: self.name().to_string(),
                    column: column.name.clone(),
                }
                .into());
            }
            return Ok(WireValue::Null(column.kind.null_kind()));
        }

        let Some(spec) = column.encrypted() else {
            return column.store_value(value).map_err(|e| e.with_table(self.name()));
        };
        let key_set = row
            .reference(&spec.key_column)?
            .ok_or_else(|| FolioError::UnsetColumn {
                table: self.name().to_string(),
                column: spec.key_column.clone(),
            })?;
        let plaintext = encrypted::encode_plain(&column.name, spec, value)?;
        let ctx = SealContext {
            table: self.name(),
            column: &column.name,
            key_set,
        };
        Ok(WireValue::Blob(cipher.seal(&ctx, &plaintext)?))
    }

    fn open_column(
        &self,
        column: &ColumnDef,
        spec: &EncryptedSpec,
        payload: &[u8],
        row: &RowValues,
        cipher: &dyn RowCipher,
    ) -> Result<Value> {
        let key_set = row
            .reference(&spec.key_column)?
            .ok_or_else(|| FolioError::Decryption {
                column: column.name.clone(),
                reason: format!("key column {} is null", spec.key_column),
            })?;
        let ctx = SealContext {
            table: self.name(),
            column: &column.name,
            key_set,
        };
        let plaintext = cipher.open(&ctx, payload)?;
        encrypted::decode_plain(&column.name, spec, &plaintext)
    }

    fn row_error(&self, err: ExError, row: &RowValues) -> ExError {
        let err = err.with_table(self.name());
        match row.get(ID_COLUMN) {
            Some(Value::Id(id)) => err.with_row_id(id.get()),
            _ => err,
        }
    }
}
