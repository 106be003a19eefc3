#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::NaiveDate;
use common::RecordingStatus;
use folio_core::dialect::DriverKind;
use folio_core::status::NoopStatus;
use folio_core::value::RowValues;
use folio_core::ExErrorKind;
use folio_store::config::load_config;
use folio_store::crypto::{KeyVault, MasterKey};
use folio_store::manifest::load_schema;
use folio_store::{DataStore, Outcome, RecordBook};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/portfolio.yaml")
}

#[test]
fn test_fixture_resolves_for_every_driver() {
    for driver in [DriverKind::Sqlite, DriverKind::Postgres, DriverKind::Mysql] {
        let schema = load_schema(&fixture(), driver).unwrap();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.driver(), driver);
        assert!(schema.has_encrypted_columns());
    }
}

#[test]
fn test_fixture_load_statement_joins_security() {
    let schema = load_schema(&fixture(), DriverKind::Sqlite).unwrap();
    assert_eq!(
        schema.load_string("lot").unwrap(),
        "select a.\"id\", a.\"security\", a.\"account\", a.\"acquired\", a.\"units\", a.\"cost\" \
         from \"lot\" a left outer join \"security\" b on a.\"security\" = b.\"id\" \
         order by b.\"symbol\", a.\"acquired\" DESC"
    );
    // no reference in the sort list: plain unaliased select
    assert_eq!(
        schema.load_string("account").unwrap(),
        "select \"id\", \"key_set\", \"title\", \"number\" from \"account\" order by \"title\""
    );
}

#[test]
fn test_missing_manifest_is_io_error() {
    let err = load_schema(Path::new("/nonexistent/folio.yaml"), DriverKind::Sqlite).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
}

#[test]
fn test_store_from_config_and_manifest_files() {
    let dir = tempfile::tempdir().unwrap();
    let master = MasterKey::generate();
    let config_path = dir.path().join("folio.yaml");
    std::fs::write(
        &config_path,
        format!(
            "driver: sqlite\naddress: {}\nbatch_size: 2\nmaster_key: {}\n",
            dir.path().join("folio.db").display(),
            master.to_base64().expose()
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    assert_eq!(config.batch_size, 2);
    let schema = load_schema(&fixture(), config.driver).unwrap();
    let mut store = DataStore::open(schema, config).unwrap();
    let mut status = RecordingStatus::default();
    assert_eq!(store.create(&mut status).unwrap(), Outcome::Completed);
    assert_eq!(status.tasks, vec!["create"]);

    let mut book = RecordBook::new();
    let keys = book.stage_insert(
        "key_set",
        RowValues::new().with("material", KeyVault::new(master).generate_key_set().unwrap()),
    );
    let security = book.stage_insert("security", RowValues::new().with("symbol", "FOLI"));
    let account = book.stage_insert(
        "account",
        RowValues::new().with("title", "brokerage").with("number", "12-3456-7"),
    );
    book.link(account, "key_set", keys);
    let lot = book.stage_insert(
        "lot",
        RowValues::new()
            .with("acquired", NaiveDate::from_ymd_opt(2023, 6, 30).unwrap())
            .with("units", Decimal::new(1500, 1)),
    );
    book.link(lot, "security", security);
    book.link(lot, "account", account);

    let report = store.synchronize(&mut book, &mut NoopStatus).unwrap();
    assert_eq!(report.inserted, 4);
    // two full batches
    assert_eq!(report.commits, 2);

    let mut loaded = RecordBook::new();
    let report = store.load(&mut loaded, &mut NoopStatus).unwrap();
    assert_eq!(report.rows, 4);
    let account = &loaded.rows("account")[0];
    assert_eq!(account.text("number").unwrap().as_deref(), Some("12-3456-7"));
    let lot = &loaded.rows("lot")[0];
    assert_eq!(lot.decimal("units").unwrap().unwrap().to_string(), "150.0000");
}
