//! Error types for UniQuery operations.

use std::fmt;

/// The primary error type for all UniQuery operations.
#[derive(Debug)]
pub enum Error {
    /// Schema errors raised while building the relation graph
    Schema(SchemaError),
    /// Query-shape errors raised while hydrating a result set
    Query(QueryError),
    /// Write-path errors raised while preparing persistence statements
    Write(WriteError),
    /// Type conversion errors
    Type(TypeError),
    /// Configuration errors
    Config(ConfigError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    /// Offending table, when the error concerns a single table
    pub table: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Table has no primary key column
    MissingPrimaryKey,
    /// Table has more than one primary key column
    MultiplePrimaryKeys,
    /// A foreign key references an unknown table
    TableNotFound,
    /// A rename key does not match any relation
    RenamedAttributeNotFound,
    /// A rename key matches more than one relation
    AmbiguousRename,
    /// Two attributes of one table resolved to the same name
    NameCollision,
    /// No candidate name of a relation is unique within its table
    NoUniqueName,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
    pub table: Option<String>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Row width differs from the pinned table list
    WrongNumberOfColumns,
    /// A participating table's primary key was not selected
    MissingPrimaryKey,
    /// A column required for linking was not selected
    MissingColumn,
    /// No model is registered for a table
    ModelNotFound,
    /// Fewer instances than rows were produced
    UnusedRows,
    /// A named column does not exist on the table
    ColumnNotFound,
}

#[derive(Debug)]
pub struct WriteError {
    pub kind: WriteErrorKind,
    pub message: String,
    pub table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// New row without id while the primary key is not auto-generated
    MissingId,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl Error {
    /// Is this a schema error raised while inferring relations?
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// Kind of schema error, if this is one.
    pub fn schema_kind(&self) -> Option<SchemaErrorKind> {
        match self {
            Error::Schema(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Kind of query error, if this is one.
    pub fn query_kind(&self) -> Option<QueryErrorKind> {
        match self {
            Error::Query(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Kind of write error, if this is one.
    pub fn write_kind(&self) -> Option<WriteErrorKind> {
        match self {
            Error::Write(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            table: None,
            column: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Write(e) => write!(f, "Write error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        Error::Write(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for UniQuery operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_accessors() {
        let err: Error =
            SchemaError::new(SchemaErrorKind::MultiplePrimaryKeys, "two keys").with_table("cars").into();
        assert!(err.is_schema_error());
        assert_eq!(err.schema_kind(), Some(SchemaErrorKind::MultiplePrimaryKeys));
        assert_eq!(err.query_kind(), None);

        let err: Error = QueryError::new(QueryErrorKind::MissingColumn, "missing")
            .with_table("invoice")
            .with_column("car_id")
            .into();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::MissingColumn));
        assert!(!err.is_schema_error());
    }

    #[test]
    fn display_prefixes() {
        let err: Error = SchemaError::new(SchemaErrorKind::TableNotFound, "no table").into();
        assert_eq!(err.to_string(), "Schema error: no table");

        let err = Error::Type(TypeError {
            expected: "i64",
            actual: "TEXT".to_string(),
            column: Some("year".to_string()),
        });
        assert_eq!(
            err.to_string(),
            "Type error in column 'year': expected i64, found TEXT"
        );

        let err = Error::Write(WriteError {
            kind: WriteErrorKind::MissingId,
            message: "no id".to_string(),
            table: "cars".to_string(),
        });
        assert_eq!(err.write_kind(), Some(WriteErrorKind::MissingId));
        assert_eq!(err.to_string(), "Write error: no id");
    }
}
