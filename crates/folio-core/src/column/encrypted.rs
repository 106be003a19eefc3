//! Plaintext formatter for encrypted columns
//!
//! The generic layer only ever sees ciphertext. Before sealing, a value is
//! rendered to UTF-8 text according to its `PlainFormat`; after opening, the
//! text is parsed back into the declared higher-level type.

use super::codec::{format_decimal, parse_decimal, DATE_FORMAT};
use super::{EncryptedSpec, PlainFormat};
use crate::errors::{ExError, FolioError, Result};
use crate::value::Value;
use chrono::NaiveDate;

pub(crate) fn accepts(format: PlainFormat, value: &Value) -> bool {
    matches!(
        (format, value),
        (_, Value::Null)
            | (PlainFormat::Integer, Value::Integer(_))
            | (PlainFormat::Long, Value::Long(_))
            | (PlainFormat::Boolean, Value::Boolean(_))
            | (PlainFormat::Date, Value::Date(_))
            | (PlainFormat::Text, Value::Text(_))
            | (PlainFormat::Decimal(_), Value::Decimal(_))
    )
}

/// Render a non-null value to the plaintext bytes that get sealed
pub fn encode_plain(column: &str, spec: &EncryptedSpec, value: &Value) -> Result<Vec<u8>> {
    let text = match (spec.plain, value) {
        (PlainFormat::Integer, Value::Integer(v)) => v.to_string(),
        (PlainFormat::Long, Value::Long(v)) => v.to_string(),
        (PlainFormat::Boolean, Value::Boolean(v)) => v.to_string(),
        (PlainFormat::Date, Value::Date(d)) => d.format(DATE_FORMAT).to_string(),
        (PlainFormat::Text, Value::Text(s)) => s.clone(),
        (PlainFormat::Decimal(kind), Value::Decimal(d)) => format_decimal(column, kind, *d)?,
        (_, other) => {
            return Err(FolioError::TypeMismatch {
                column: column.to_string(),
                expected: format!("{:?}", spec.plain),
                found: other.type_name().to_string(),
            }
            .into())
        }
    };
    if text.len() > spec.plain_length as usize {
        return Err(FolioError::ValueTooLong {
            column: column.to_string(),
            length: text.len(),
            max: spec.plain_length as usize,
        }
        .into());
    }
    Ok(text.into_bytes())
}

/// Parse opened plaintext back into the declared type
pub fn decode_plain(column: &str, spec: &EncryptedSpec, plaintext: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(plaintext).map_err(|e| malformed(column, e.to_string()))?;
    match spec.plain {
        PlainFormat::Integer => text
            .parse::<i32>()
            .map(Value::Integer)
            .map_err(|e| malformed(column, e.to_string())),
        PlainFormat::Long => text
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|e| malformed(column, e.to_string())),
        PlainFormat::Boolean => text
            .parse::<bool>()
            .map(Value::Boolean)
            .map_err(|e| malformed(column, e.to_string())),
        PlainFormat::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| malformed(column, e.to_string())),
        PlainFormat::Text => Ok(Value::Text(text.to_string())),
        PlainFormat::Decimal(kind) => parse_decimal(column, kind, text).map(Value::Decimal),
    }
}

fn malformed(column: &str, reason: String) -> ExError {
    FolioError::Decryption {
        column: column.to_string(),
        reason: format!("plaintext does not parse: {}", reason),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherSuite;
    use crate::column::DecimalKind;
    use crate::errors::ExErrorKind;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn spec(plain: PlainFormat, plain_length: u32) -> EncryptedSpec {
        EncryptedSpec {
            plain,
            plain_length,
            key_column: "key_set".to_string(),
            suite: CipherSuite::Aes256Gcm,
        }
    }

    #[test]
    fn test_decimal_plaintext_round_trip() {
        let s = spec(PlainFormat::Decimal(DecimalKind::Money), 24);
        let value = Value::Decimal(Decimal::from_str("1050.25").unwrap());
        let bytes = encode_plain("balance", &s, &value).unwrap();
        assert_eq!(bytes, b"1050.2500");
        assert_eq!(decode_plain("balance", &s, &bytes).unwrap(), value);
    }

    #[test]
    fn test_plaintext_longer_than_declared_is_rejected() {
        let s = spec(PlainFormat::Text, 4);
        let err = encode_plain("memo", &s, &Value::Text("too long".to_string())).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ValueTooLong);
    }

    #[test]
    fn test_garbage_plaintext_is_decryption_error() {
        let s = spec(PlainFormat::Long, 20);
        let err = decode_plain("account_no", &s, b"12x").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Decryption);
        assert!(err.is_data());
    }
}
