//! Native ↔ wire conversion per column kind

use super::{ColumnDef, ColumnKind, DecimalKind};
use crate::errors::{ExError, ExErrorKind, FolioError, Result};
use crate::value::{RowId, Value};
use crate::wire::{Cursor, WireValue};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

impl ColumnDef {
    /// Check that `value` may be written through this column's codec
    ///
    /// Null passes here; nullability is enforced by the owning table.
    pub fn check_value(&self, value: &Value) -> Result<()> {
        let ok = match (&self.kind, value) {
            (_, Value::Null) => true,
            (ColumnKind::Identifier | ColumnKind::Reference(_), Value::Id(_)) => true,
            (ColumnKind::Integer, Value::Integer(_)) => true,
            (ColumnKind::Long, Value::Long(_)) => true,
            (ColumnKind::Boolean, Value::Boolean(_)) => true,
            (ColumnKind::Date, Value::Date(_)) => true,
            (ColumnKind::String { .. }, Value::Text(_)) => true,
            (ColumnKind::Binary { .. }, Value::Binary(_)) => true,
            (ColumnKind::Decimal(_), Value::Decimal(_)) => true,
            (ColumnKind::Encrypted(spec), v) => {
                super::encrypted::accepts(spec.plain, v)
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(FolioError::TypeMismatch {
                column: self.name.clone(),
                expected: self.kind.value_type().to_string(),
                found: value.type_name().to_string(),
            }
            .into())
        }
    }

    /// Encode a native value into its wire form
    ///
    /// An absent value becomes the typed null marker of this column's kind.
    /// Encrypted columns are sealed by the owning table, which knows the
    /// row's key set; calling this on one is a defect.
    pub fn store_value(&self, value: &Value) -> Result<WireValue> {
        self.check_value(value)?;
        if value.is_null() {
            return Ok(WireValue::Null(self.kind.null_kind()));
        }
        match (&self.kind, value) {
            (ColumnKind::Identifier | ColumnKind::Reference(_), Value::Id(id)) => {
                Ok(WireValue::Integer(id.get()))
            }
            (ColumnKind::Integer, Value::Integer(v)) => Ok(WireValue::Integer(i64::from(*v))),
            (ColumnKind::Long, Value::Long(v)) => Ok(WireValue::Integer(*v)),
            (ColumnKind::Boolean, Value::Boolean(v)) => Ok(WireValue::Integer(i64::from(*v))),
            (ColumnKind::Date, Value::Date(d)) => {
                Ok(WireValue::Text(d.format(DATE_FORMAT).to_string()))
            }
            (ColumnKind::String { length }, Value::Text(s)) => {
                check_length(&self.name, s.chars().count(), *length)?;
                Ok(WireValue::Text(s.clone()))
            }
            (ColumnKind::Binary { length }, Value::Binary(b)) => {
                check_length(&self.name, b.len(), *length)?;
                Ok(WireValue::Blob(b.clone()))
            }
            (ColumnKind::Decimal(kind), Value::Decimal(d)) => {
                Ok(WireValue::Text(format_decimal(&self.name, *kind, *d)?))
            }
            (ColumnKind::Encrypted(_), _) => Err(ExError::new(ExErrorKind::InvalidSchema)
                .with_column(self.name.clone())
                .with_message("encrypted column must be sealed through its row cipher")),
            _ => Err(ExError::new(ExErrorKind::Internal)
                .with_column(self.name.clone())
                .with_message("value passed check_value but has no encoding")),
        }
    }

    /// Read this column from `cursor` at `position`
    pub fn load_value(&self, cursor: &dyn Cursor, position: usize) -> Result<Value> {
        self.decode(cursor.read(position)?)
    }

    /// Decode a wire value; the driver's null becomes `Value::Null`
    pub fn decode(&self, wire: WireValue) -> Result<Value> {
        if wire.is_null() {
            return Ok(Value::Null);
        }
        match (&self.kind, wire) {
            (ColumnKind::Identifier | ColumnKind::Reference(_), WireValue::Integer(v)) => {
                Ok(Value::Id(RowId(v)))
            }
            (ColumnKind::Integer, WireValue::Integer(v)) => i32::try_from(v)
                .map(Value::Integer)
                .map_err(|_| self.malformed(format!("{} does not fit an integer column", v))),
            (ColumnKind::Long, WireValue::Integer(v)) => Ok(Value::Long(v)),
            (ColumnKind::Boolean, WireValue::Integer(v)) => Ok(Value::Boolean(v != 0)),
            (ColumnKind::Boolean, WireValue::Text(s)) => match s.as_str() {
                "1" | "true" | "t" => Ok(Value::Boolean(true)),
                "0" | "false" | "f" => Ok(Value::Boolean(false)),
                other => Err(self.malformed(format!("'{}' is not a boolean", other))),
            },
            (ColumnKind::Date, WireValue::Text(s)) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| self.malformed(format!("'{}' is not a date: {}", s, e))),
            (ColumnKind::String { .. }, WireValue::Text(s)) => Ok(Value::Text(s)),
            (ColumnKind::Binary { .. }, WireValue::Blob(b)) => Ok(Value::Binary(b)),
            (ColumnKind::Decimal(kind), wire) => {
                parse_decimal_wire(&self.name, *kind, wire).map(Value::Decimal)
            }
            (ColumnKind::Encrypted(_), WireValue::Blob(b)) => Ok(Value::Binary(b)),
            (kind, wire) => Err(self.malformed(format!(
                "{} column cannot hold a {} value",
                kind.value_type(),
                wire.type_name()
            ))),
        }
    }

    fn malformed(&self, reason: String) -> ExError {
        FolioError::MalformedValue {
            column: self.name.clone(),
            reason,
        }
        .into()
    }
}

fn check_length(column: &str, length: usize, max: u32) -> Result<()> {
    if length > max as usize {
        return Err(FolioError::ValueTooLong {
            column: column.to_string(),
            length,
            max: max as usize,
        }
        .into());
    }
    Ok(())
}

/// Render a decimal at the kind's fixed scale, e.g. `12.3400`
///
/// Significant fractional digits beyond the scale are refused rather than
/// rounded away; trailing zeros past it are fine.
pub(crate) fn format_decimal(column: &str, kind: DecimalKind, value: Decimal) -> Result<String> {
    let fraction_digits = value.normalize().scale();
    if fraction_digits > kind.scale() {
        return Err(FolioError::ValueTooLong {
            column: column.to_string(),
            length: fraction_digits as usize,
            max: kind.scale() as usize,
        }
        .into());
    }
    let mut scaled = value;
    scaled.rescale(kind.scale());
    let integer_digits = scaled.abs().trunc().to_string().len();
    let max_integer_digits = (kind.precision() - kind.scale()) as usize;
    if integer_digits > max_integer_digits {
        return Err(FolioError::ValueTooLong {
            column: column.to_string(),
            length: integer_digits,
            max: max_integer_digits,
        }
        .into());
    }
    Ok(scaled.to_string())
}

/// Parse a string-encoded decimal and normalize it to the kind's scale
pub(crate) fn parse_decimal(column: &str, kind: DecimalKind, text: &str) -> Result<Decimal> {
    let mut parsed = Decimal::from_str(text.trim()).map_err(|e| {
        ExError::from(FolioError::MalformedDecimal {
            column: column.to_string(),
            text: text.to_string(),
            reason: e.to_string(),
        })
    })?;
    parsed.rescale(kind.scale());
    Ok(parsed)
}

fn parse_decimal_wire(column: &str, kind: DecimalKind, wire: WireValue) -> Result<Decimal> {
    match wire {
        WireValue::Text(s) => parse_decimal(column, kind, &s),
        WireValue::Integer(v) => {
            let mut d = Decimal::from(v);
            d.rescale(kind.scale());
            Ok(d)
        }
        // Server dialects may hand numerics back as floating point
        WireValue::Real(f) => {
            let mut d = Decimal::try_from(f).map_err(|e| {
                ExError::from(FolioError::MalformedDecimal {
                    column: column.to_string(),
                    text: f.to_string(),
                    reason: e.to_string(),
                })
            })?;
            d.rescale(kind.scale());
            Ok(d)
        }
        other => Err(FolioError::MalformedDecimal {
            column: column.to_string(),
            text: format!("<{}>", other.type_name()),
            reason: "not a numeric value".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnKind, TableRef};
    use crate::wire::NullKind;
    use proptest::prelude::*;

    fn col(kind: ColumnKind) -> ColumnDef {
        ColumnDef::new("c", kind)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_null_uses_kind_specific_marker() {
        let cases = [
            (ColumnKind::Long, NullKind::Numeric),
            (ColumnKind::Decimal(DecimalKind::Money), NullKind::Numeric),
            (ColumnKind::String { length: 8 }, NullKind::Text),
            (ColumnKind::Date, NullKind::Date),
            (ColumnKind::Boolean, NullKind::Boolean),
            (ColumnKind::Binary { length: 8 }, NullKind::Binary),
        ];
        for (kind, marker) in cases {
            assert_eq!(col(kind).store_value(&Value::Null).unwrap(), WireValue::Null(marker));
        }
    }

    #[test]
    fn test_driver_null_loads_as_null() {
        let column = col(ColumnKind::Date);
        assert_eq!(column.decode(WireValue::Null(NullKind::Text)).unwrap(), Value::Null);
    }

    #[test]
    fn test_decimal_is_written_at_fixed_scale() {
        let money = col(ColumnKind::Decimal(DecimalKind::Money));
        assert_eq!(
            money.store_value(&Value::Decimal(dec("12.34"))).unwrap(),
            WireValue::Text("12.3400".to_string())
        );
        let ratio = col(ColumnKind::Decimal(DecimalKind::Ratio));
        assert_eq!(
            ratio.store_value(&Value::Decimal(dec("0.5"))).unwrap(),
            WireValue::Text("0.500000".to_string())
        );
    }

    #[test]
    fn test_decimal_overflowing_precision_is_rejected() {
        let money = col(ColumnKind::Decimal(DecimalKind::Money));
        let err = money
            .store_value(&Value::Decimal(dec("1234567890123456")))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ValueTooLong);
    }

    #[test]
    fn test_decimal_beyond_scale_is_rejected_not_rounded() {
        let money = col(ColumnKind::Decimal(DecimalKind::Money));
        let err = money.store_value(&Value::Decimal(dec("1.23456"))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ValueTooLong);
        assert_eq!(err.column(), Some("c"));
        assert_eq!(
            money.store_value(&Value::Decimal(dec("1.23450"))).unwrap(),
            WireValue::Text("1.2345".to_string())
        );
        assert_eq!(
            money.store_value(&Value::Decimal(dec("1.2"))).unwrap(),
            WireValue::Text("1.2000".to_string())
        );
        let ratio = col(ColumnKind::Decimal(DecimalKind::Ratio));
        assert!(ratio.store_value(&Value::Decimal(dec("0.123456"))).is_ok());
    }

    #[test]
    fn test_malformed_decimal_is_data_error() {
        let price = col(ColumnKind::Decimal(DecimalKind::Price));
        let err = price.decode(WireValue::Text("12,50".to_string())).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MalformedDecimal);
        assert!(err.is_data());
    }

    #[test]
    fn test_decimal_accepts_numeric_wire_forms() {
        let units = col(ColumnKind::Decimal(DecimalKind::Units));
        assert_eq!(units.decode(WireValue::Integer(3)).unwrap(), Value::Decimal(dec("3")));
        assert_eq!(units.decode(WireValue::Real(2.5)).unwrap(), Value::Decimal(dec("2.5")));
    }

    #[test]
    fn test_wrong_native_type_is_type_mismatch() {
        let err = col(ColumnKind::Long)
            .store_value(&Value::Text("7".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::TypeMismatch);
    }

    #[test]
    fn test_string_length_is_enforced() {
        let err = col(ColumnKind::String { length: 3 })
            .store_value(&Value::Text("abcd".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ValueTooLong);
    }

    #[test]
    fn test_date_round_trips_through_iso_text() {
        let column = col(ColumnKind::Date);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let wire = column.store_value(&Value::Date(date)).unwrap();
        assert_eq!(wire, WireValue::Text("2024-02-29".to_string()));
        assert_eq!(column.decode(wire).unwrap(), Value::Date(date));
    }

    #[test]
    fn test_reference_exchanges_row_ids() {
        let column = col(ColumnKind::Reference(TableRef::unresolved("security")));
        let wire = column.store_value(&Value::Id(RowId(42))).unwrap();
        assert_eq!(wire, WireValue::Integer(42));
        assert_eq!(column.decode(wire).unwrap(), Value::Id(RowId(42)));
    }

    #[test]
    fn test_integer_overflow_is_malformed() {
        let err = col(ColumnKind::Integer)
            .decode(WireValue::Integer(i64::MAX))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::MalformedValue);
    }

    #[test]
    fn test_load_value_reads_cursor_position() {
        let row = vec![WireValue::Integer(1), WireValue::Integer(0)];
        let column = col(ColumnKind::Boolean);
        assert_eq!(column.load_value(&row, 1).unwrap(), Value::Boolean(false));
    }

    proptest! {
        #[test]
        fn prop_money_round_trips(mantissa in -999_999_999_999_999i64..999_999_999_999_999i64) {
            let column = col(ColumnKind::Decimal(DecimalKind::Money));
            let value = Decimal::new(mantissa, 4);
            let wire = column.store_value(&Value::Decimal(value)).unwrap();
            prop_assert_eq!(column.decode(wire).unwrap(), Value::Decimal(value));
        }

        #[test]
        fn prop_dilution_round_trips(mantissa in -9_999_999_999_999i64..9_999_999_999_999i64) {
            let column = col(ColumnKind::Decimal(DecimalKind::Dilution));
            let value = Decimal::new(mantissa, 6);
            let wire = column.store_value(&Value::Decimal(value)).unwrap();
            prop_assert_eq!(column.decode(wire).unwrap(), Value::Decimal(value));
        }
    }
}
