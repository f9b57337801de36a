//! SQL dialect conventions used when rendering statements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite dialect (uses ?1, ?2 placeholders)
    #[default]
    Sqlite,
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    Postgres,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect.
    ///
    /// Embedded quote characters are doubled.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// SQL type of a primary-key column the database fills in on insert.
    ///
    /// Compared case-insensitively against the declared column type.
    pub const fn autoincrement_type(self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some("INTEGER"),
            Dialect::Postgres => Some("integer"),
            Dialect::Mysql => None,
        }
    }

    /// Whether `sql_type` is generated by the database for primary keys.
    pub fn is_autoincrement(self, sql_type: &str) -> bool {
        self.autoincrement_type()
            .is_some_and(|t| t.eq_ignore_ascii_case(sql_type.trim()))
    }

    /// Whether `INSERT ... RETURNING` is used to read back generated keys.
    pub const fn supports_returning(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(3), "?3");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Mysql.placeholder(3), "?");
    }

    #[test]
    fn quoting_escapes_quotes() {
        assert_eq!(Dialect::Sqlite.quote_identifier("cars"), "\"cars\"");
        assert_eq!(Dialect::Postgres.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Mysql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn autoincrement_is_case_insensitive() {
        assert!(Dialect::Sqlite.is_autoincrement("integer"));
        assert!(Dialect::Postgres.is_autoincrement("INTEGER"));
        assert!(!Dialect::Sqlite.is_autoincrement("TEXT"));
        assert!(!Dialect::Mysql.is_autoincrement("INTEGER"));
    }
}
