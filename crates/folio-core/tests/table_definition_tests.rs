#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use folio_core::cipher::NoCipher;
use folio_core::column::{DecimalKind, SortOrder};
use folio_core::dialect::DriverKind;
use folio_core::wire::{NullKind, WireValue};
use folio_core::{RowId, RowValues, SchemaBuilder, TableBuilder, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

fn every_kind() -> TableBuilder {
    TableBuilder::new("sample")
        .integer("small")
        .nullable()
        .long("big")
        .nullable()
        .boolean("flag")
        .nullable()
        .date("on")
        .nullable()
        .sort(SortOrder::Descending)
        .string("label", 16)
        .nullable()
        .binary("blob", 8)
        .nullable()
        .decimal("money", DecimalKind::Money)
        .nullable()
        .decimal("dilution", DecimalKind::Dilution)
        .nullable()
}

#[test]
fn test_every_kind_survives_encode_and_decode() {
    let schema = SchemaBuilder::new(DriverKind::Sqlite)
        .table(TableBuilder::new("owner"))
        .table(every_kind().reference("owner", "owner").nullable())
        .build()
        .unwrap();
    let table = schema.table("sample").unwrap();

    let row = RowValues::new()
        .with("small", -12i32)
        .with("big", 9_000_000_000i64)
        .with("flag", true)
        .with("on", NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        .with("label", "hello")
        .with("blob", vec![0u8, 255, 7])
        .with("money", Decimal::from_str("-1234.5").unwrap())
        .with("dilution", Decimal::from_str("0.123456").unwrap())
        .with("owner", RowId(3));

    let mut wire = vec![WireValue::Integer(1)];
    wire.extend(table.encode_insert(&row, &NoCipher).unwrap());
    let loaded = table.decode_row(&wire, &NoCipher).unwrap();

    assert_eq!(loaded.id(), Some(RowId(1)));
    for field in row.fields() {
        let expected = row.get(field).unwrap();
        let actual = loaded.get(field).unwrap();
        match (expected, actual) {
            (Value::Decimal(a), Value::Decimal(b)) => assert_eq!(a, b, "field {}", field),
            _ => assert_eq!(expected, actual, "field {}", field),
        }
    }
    assert_eq!(loaded.decimal("money").unwrap().unwrap().to_string(), "-1234.5000");
}

#[test]
fn test_nullable_columns_store_typed_nulls_and_reload_absent() {
    let schema = SchemaBuilder::new(DriverKind::Postgres)
        .table(every_kind())
        .build()
        .unwrap();
    let table = schema.table("sample").unwrap();

    let params = table.encode_insert(&RowValues::new(), &NoCipher).unwrap();
    assert_eq!(
        params,
        vec![
            WireValue::Null(NullKind::Numeric),
            WireValue::Null(NullKind::Numeric),
            WireValue::Null(NullKind::Boolean),
            WireValue::Null(NullKind::Date),
            WireValue::Null(NullKind::Text),
            WireValue::Null(NullKind::Binary),
            WireValue::Null(NullKind::Numeric),
            WireValue::Null(NullKind::Numeric),
        ]
    );

    let mut wire = vec![WireValue::Integer(2)];
    wire.extend(params);
    let loaded = table.decode_row(&wire, &NoCipher).unwrap();
    assert_eq!(loaded.integer("small").unwrap(), None);
    assert_eq!(loaded.date("on").unwrap(), None);
    assert_eq!(loaded.text("label").unwrap(), None);
}

#[test]
fn test_overlong_string_is_rejected() {
    let schema = SchemaBuilder::new(DriverKind::Sqlite)
        .table(every_kind())
        .build()
        .unwrap();
    let table = schema.table("sample").unwrap();
    let row = RowValues::new().with("label", "this label is far too long");
    let err = table.encode_insert(&row, &NoCipher).unwrap_err();
    assert_eq!(err.kind(), folio_core::ExErrorKind::ValueTooLong);
}

#[test]
fn test_mysql_ddl() {
    let schema = SchemaBuilder::new(DriverKind::Mysql)
        .table(TableBuilder::new("fx").date("on").decimal("rate", DecimalKind::Rate))
        .build()
        .unwrap();
    assert_eq!(
        schema.table("fx").unwrap().create_string(),
        "create table \"fx\" (\"id\" bigint auto_increment primary key, \
         \"on\" date not null, \"rate\" numeric(19,4) not null)"
    );
}
