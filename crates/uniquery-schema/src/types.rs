//! SQL column type parsing and scalar type mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed SQL type with extracted metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSqlType {
    /// Base type name (e.g., VARCHAR, INTEGER, DECIMAL)
    pub base_type: String,
    /// Length for character types (e.g., VARCHAR(255) -> 255)
    pub length: Option<u32>,
    /// Precision for numeric types (e.g., DECIMAL(10,2) -> 10)
    pub precision: Option<u32>,
    /// Scale for numeric types (e.g., DECIMAL(10,2) -> 2)
    pub scale: Option<u32>,
    /// Whether the type is unsigned (MySQL)
    pub unsigned: bool,
}

impl ParsedSqlType {
    /// Parse a SQL type string into structured metadata.
    ///
    /// # Examples
    /// - `VARCHAR(255)` -> base_type: "VARCHAR", length: 255
    /// - `DECIMAL(10,2)` -> base_type: "DECIMAL", precision: 10, scale: 2
    /// - `INT UNSIGNED` -> base_type: "INT", unsigned: true
    pub fn parse(type_str: &str) -> Self {
        let upper = type_str.trim().to_uppercase();

        let (type_str, unsigned) = match upper.strip_suffix(" UNSIGNED") {
            Some(rest) => (rest, true),
            None => (upper.as_str(), false),
        };

        let Some(paren_start) = type_str.find('(') else {
            return Self {
                base_type: type_str.to_string(),
                unsigned,
                ..Self::default()
            };
        };

        let base_type = type_str[..paren_start].trim().to_string();
        let params = type_str[paren_start + 1..].trim_end_matches(')');

        if let Some((precision, scale)) = params.split_once(',') {
            Self {
                base_type,
                precision: precision.trim().parse().ok(),
                scale: scale.trim().parse().ok(),
                unsigned,
                ..Self::default()
            }
        } else {
            Self {
                base_type,
                length: params.trim().parse().ok(),
                unsigned,
                ..Self::default()
            }
        }
    }
}

/// Application-side scalar type a column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Integer,
    Float,
    Text,
    DateTime,
    Bytes,
    /// Declared type with no known mapping; values pass through untouched
    Unknown,
}

impl ScalarType {
    /// Map a declared SQL column type to its scalar type.
    ///
    /// `TIME` is stored as an integer count, matching how the drivers
    /// return it.
    pub fn from_sql_type(sql_type: &str) -> Self {
        let parsed = ParsedSqlType::parse(sql_type);
        match parsed.base_type.as_str() {
            "INTEGER" | "INT" | "SMALLINT" | "BIGINT" | "TINYINT" | "TIME" => ScalarType::Integer,
            "REAL" | "DOUBLE PRECISION" | "DOUBLE" | "FLOAT" | "NUMERIC" | "DECIMAL" => {
                ScalarType::Float
            }
            "VARCHAR" | "CHARACTER VARYING" | "TEXT" | "CHAR" => ScalarType::Text,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => ScalarType::DateTime,
            "BLOB" | "BYTEA" => ScalarType::Bytes,
            _ => ScalarType::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Text => "text",
            ScalarType::DateTime => "datetime",
            ScalarType::Bytes => "bytes",
            ScalarType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
