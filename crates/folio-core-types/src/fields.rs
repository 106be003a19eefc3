//! Canonical field keys and event names for structured logging

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_OP_ID: &str = "op_id";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Schema coordinates
pub const FIELD_TABLE: &str = "table";
pub const FIELD_COLUMN: &str = "column";
pub const FIELD_ROW_ID: &str = "row_id";
pub const FIELD_STAGE: &str = "stage";

// Counters
pub const FIELD_ROWS: &str = "rows";
pub const FIELD_REJECTED: &str = "rejected";
pub const FIELD_COMMITS: &str = "commits";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_CANCELLED: &str = "cancelled";
