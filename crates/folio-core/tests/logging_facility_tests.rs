#![allow(clippy::unwrap_used, clippy::expect_used)]

use folio_core::errors::{ExError, FolioError};
use folio_core::logging_facility::test_capture::init_test_capture;
use folio_core::types::fields::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use folio_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, table = "lot");

    let starts: Vec<_> = capture
        .events_for(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0].field("table"), Some("lot"));
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42, rows = 7);

    let ends: Vec<_> = capture
        .events_for(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("duration_ms"), Some("42"));
    assert_eq!(ends[0].field("rows"), Some("7"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err: ExError = FolioError::UnknownTable {
        table: "ghost".to_string(),
    }
    .into();
    log_op_error!(op_name, &err, duration_ms = 10);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let event = capture
        .events_for(op_name)
        .into_iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .unwrap();
    assert_eq!(event.field("err_code"), Some("ERR_UNKNOWN_TABLE"));
    assert_eq!(event.level, tracing::Level::ERROR);
}

#[test]
fn test_single_start_and_end_per_operation() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_4";

    log_op_start!(op_name);
    log_op_end!(op_name, duration_ms = 1);

    let events = capture.events_for(op_name);
    let starts = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .count();
    let ends = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .count();
    assert_eq!((starts, ends), (1, 1));
}
