use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// The three failure classes the persistence core distinguishes
///
/// - `Logic`: schema misuse. Always a defect; never retried.
/// - `Io`: connection or driver failure. The store closes its connection.
/// - `Data`: a persisted value could not be decoded. Reported per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Logic,
    Io,
    Data,
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code and to exactly one `ErrorClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Schema misuse
    TypeMismatch,
    UnknownColumn,
    UnknownTable,
    DuplicateColumn,
    DuplicateTable,
    UnsetColumn,
    NullViolation,
    MissingIdentifier,
    UnexpectedIdentifier,
    UnresolvedReference,
    DependencyOrder,
    AliasExhausted,
    InvalidSchema,
    InvalidConfig,
    UnsupportedDriver,
    ValueTooLong,
    /// The database refused a write on a declared constraint
    ConstraintViolation,

    // Connection / driver
    Io,
    Persistence,
    StoreClosed,

    // Persisted data
    MalformedValue,
    MalformedDecimal,
    Decryption,
    MissingKeySet,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::UnknownColumn => "ERR_UNKNOWN_COLUMN",
            ExErrorKind::UnknownTable => "ERR_UNKNOWN_TABLE",
            ExErrorKind::DuplicateColumn => "ERR_DUPLICATE_COLUMN",
            ExErrorKind::DuplicateTable => "ERR_DUPLICATE_TABLE",
            ExErrorKind::UnsetColumn => "ERR_UNSET_COLUMN",
            ExErrorKind::NullViolation => "ERR_NULL_VIOLATION",
            ExErrorKind::MissingIdentifier => "ERR_MISSING_IDENTIFIER",
            ExErrorKind::UnexpectedIdentifier => "ERR_UNEXPECTED_IDENTIFIER",
            ExErrorKind::UnresolvedReference => "ERR_UNRESOLVED_REFERENCE",
            ExErrorKind::DependencyOrder => "ERR_DEPENDENCY_ORDER",
            ExErrorKind::AliasExhausted => "ERR_ALIAS_EXHAUSTED",
            ExErrorKind::InvalidSchema => "ERR_INVALID_SCHEMA",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::UnsupportedDriver => "ERR_UNSUPPORTED_DRIVER",
            ExErrorKind::ValueTooLong => "ERR_VALUE_TOO_LONG",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::StoreClosed => "ERR_STORE_CLOSED",
            ExErrorKind::MalformedValue => "ERR_MALFORMED_VALUE",
            ExErrorKind::MalformedDecimal => "ERR_MALFORMED_DECIMAL",
            ExErrorKind::Decryption => "ERR_DECRYPTION",
            ExErrorKind::MissingKeySet => "ERR_MISSING_KEY_SET",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Failure class of this kind
    pub fn class(&self) -> ErrorClass {
        match self {
            ExErrorKind::Io | ExErrorKind::Persistence | ExErrorKind::StoreClosed => {
                ErrorClass::Io
            }
            ExErrorKind::MalformedValue
            | ExErrorKind::MalformedDecimal
            | ExErrorKind::Decryption
            | ExErrorKind::MissingKeySet => ErrorClass::Data,
            ExErrorKind::TypeMismatch
            | ExErrorKind::UnknownColumn
            | ExErrorKind::UnknownTable
            | ExErrorKind::DuplicateColumn
            | ExErrorKind::DuplicateTable
            | ExErrorKind::UnsetColumn
            | ExErrorKind::NullViolation
            | ExErrorKind::MissingIdentifier
            | ExErrorKind::UnexpectedIdentifier
            | ExErrorKind::UnresolvedReference
            | ExErrorKind::DependencyOrder
            | ExErrorKind::AliasExhausted
            | ExErrorKind::InvalidSchema
            | ExErrorKind::InvalidConfig
            | ExErrorKind::UnsupportedDriver
            | ExErrorKind::ValueTooLong
            | ExErrorKind::ConstraintViolation
            | ExErrorKind::Internal => ErrorClass::Logic,
        }
    }
}

/// Canonical structured error type
///
/// Carries a kind for programmatic handling plus optional schema coordinates
/// (table, column, row id) for diagnostics.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    column: Option<String>,
    row_id: Option<i64>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            column: None,
            row_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add column context
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Add row identifier context
    pub fn with_row_id(mut self, row_id: i64) -> Self {
        self.row_id = Some(row_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn row_id(&self) -> Option<i64> {
        self.row_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    pub fn is_logic(&self) -> bool {
        self.class() == ErrorClass::Logic
    }

    pub fn is_io(&self) -> bool {
        self.class() == ErrorClass::Io
    }

    pub fn is_data(&self) -> bool {
        self.class() == ErrorClass::Data
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {})", column)?;
        }
        if let Some(row_id) = self.row_id {
            write!(f, " (row_id: {})", row_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Descriptive failures raised by the column/table machinery
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FolioError {
    /// A value was read or written through the wrong codec
    #[error("Column {column} holds {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },

    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Column {column} declared twice in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {table} registered twice")]
    DuplicateTable { table: String },

    /// Insert of a row with no value for a non-nullable column
    #[error("Non-nullable column {table}.{column} was never set")]
    UnsetColumn { table: String, column: String },

    /// The key column moved but an encrypted column it keys was not resealed
    #[error("Update of {table}.{key_column} must also set encrypted column {column}")]
    KeyChangeUnsealed {
        table: String,
        key_column: String,
        column: String,
    },

    #[error("Non-nullable column {table}.{column} set to null")]
    NullViolation { table: String, column: String },

    #[error("Row of table {table} has no identifier")]
    MissingIdentifier { table: String },

    #[error("New row of table {table} already carries identifier {row_id}")]
    UnexpectedIdentifier { table: String, row_id: i64 },

    #[error("Column {table}.{column} references unknown table {target}")]
    UnresolvedReference {
        table: String,
        column: String,
        target: String,
    },

    /// A reference points at a table registered at or after the referencing one
    #[error("Column {table}.{column} references {target}, which is not registered before {table}")]
    DependencyOrder {
        table: String,
        column: String,
        target: String,
    },

    #[error("Sort chain of table {table} needs more than 26 table aliases")]
    AliasExhausted { table: String },

    #[error("Value for column {column} is {length} long, limit is {max}")]
    ValueTooLong {
        column: String,
        length: usize,
        max: usize,
    },

    #[error("Column {column} holds malformed decimal '{text}': {reason}")]
    MalformedDecimal {
        column: String,
        text: String,
        reason: String,
    },

    #[error("Column {column} holds malformed value: {reason}")]
    MalformedValue { column: String, reason: String },

    #[error("Column {column} could not be decrypted: {reason}")]
    Decryption { column: String, reason: String },

    #[error("Column {column} is protected by unknown key set {key_set}")]
    MissingKeySet { column: String, key_set: i64 },

    #[error("Data store is closed")]
    StoreClosed,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from FolioError to ExError
impl From<FolioError> for ExError {
    fn from(err: FolioError) -> Self {
        let message = err.to_string();
        match err {
            FolioError::TypeMismatch { column, .. } => ExError::new(ExErrorKind::TypeMismatch)
                .with_column(column)
                .with_message(message),
            FolioError::UnknownColumn { table, column } => {
                ExError::new(ExErrorKind::UnknownColumn)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::UnknownTable { table } => ExError::new(ExErrorKind::UnknownTable)
                .with_table(table)
                .with_message(message),
            FolioError::DuplicateColumn { table, column } => {
                ExError::new(ExErrorKind::DuplicateColumn)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::DuplicateTable { table } => ExError::new(ExErrorKind::DuplicateTable)
                .with_table(table)
                .with_message(message),
            FolioError::UnsetColumn { table, column } => ExError::new(ExErrorKind::UnsetColumn)
                .with_table(table)
                .with_column(column)
                .with_message(message),
            FolioError::KeyChangeUnsealed { table, column, .. } => {
                ExError::new(ExErrorKind::UnsetColumn)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::NullViolation { table, column } => {
                ExError::new(ExErrorKind::NullViolation)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::MissingIdentifier { table } => {
                ExError::new(ExErrorKind::MissingIdentifier)
                    .with_table(table)
                    .with_message(message)
            }
            FolioError::UnexpectedIdentifier { table, row_id } => {
                ExError::new(ExErrorKind::UnexpectedIdentifier)
                    .with_table(table)
                    .with_row_id(row_id)
                    .with_message(message)
            }
            FolioError::UnresolvedReference { table, column, .. } => {
                ExError::new(ExErrorKind::UnresolvedReference)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::DependencyOrder { table, column, .. } => {
                ExError::new(ExErrorKind::DependencyOrder)
                    .with_table(table)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::AliasExhausted { table } => ExError::new(ExErrorKind::AliasExhausted)
                .with_table(table)
                .with_message(message),
            FolioError::ValueTooLong { column, .. } => ExError::new(ExErrorKind::ValueTooLong)
                .with_column(column)
                .with_message(message),
            FolioError::MalformedDecimal { column, .. } => {
                ExError::new(ExErrorKind::MalformedDecimal)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::MalformedValue { column, .. } => {
                ExError::new(ExErrorKind::MalformedValue)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::Decryption { column, .. } => ExError::new(ExErrorKind::Decryption)
                .with_column(column)
                .with_message(message),
            FolioError::MissingKeySet { column, .. } => {
                ExError::new(ExErrorKind::MissingKeySet)
                    .with_column(column)
                    .with_message(message)
            }
            FolioError::StoreClosed => ExError::new(ExErrorKind::StoreClosed).with_message(message),
            FolioError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}
