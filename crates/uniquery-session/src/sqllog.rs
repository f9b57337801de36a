//! One-line rendering of SQL statements for logs.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use uniquery_core::{Dialect, Value};

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern = pattern, error = %e, "Invalid SQL log pattern");
            None
        }
    })
    .as_ref()
}

fn comment_lines() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"(?m)^\s*--.*?$")
}

fn whitespace() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"\s+")
}

fn placeholders(dialect: Dialect) -> Option<&'static Regex> {
    static QUESTION: OnceLock<Option<Regex>> = OnceLock::new();
    static DOLLAR: OnceLock<Option<Regex>> = OnceLock::new();
    match dialect {
        Dialect::Postgres => compiled(&DOLLAR, r"\$(\d+)"),
        Dialect::Sqlite | Dialect::Mysql => compiled(&QUESTION, r"\?(\d*)"),
    }
}

/// `:name` parameters. The `::` of a cast is matched too so it can be kept.
fn named_placeholders() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"::|:([A-Za-z_][A-Za-z0-9_]*)")
}

/// SQL literal for a parameter: strings quoted, NULL spelled out.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''")),
        other => other.to_string(),
    }
}

/// Format a statement and its parameters as a single line.
///
/// Full-line `--` comments are dropped and whitespace runs collapse to one
/// space (inside string literals too). Placeholders are replaced by their
/// parameters; if the number of placeholders does not match the number of
/// parameters the statement is followed by the parameter list instead.
pub fn format_sql_for_log(sql: &str, params: &[Value], dialect: Dialect) -> String {
    let cmd = single_line(sql);
    if params.is_empty() {
        return cmd;
    }

    let fallback = || {
        let list: Vec<String> = params.iter().map(literal).collect();
        format!("{cmd}, [{}]", list.join(", "))
    };

    let Some(re) = placeholders(dialect) else {
        return fallback();
    };
    if re.find_iter(&cmd).count() != params.len() {
        return fallback();
    }

    let mut next = 0;
    let mut in_range = true;
    let formatted = re.replace_all(&cmd, |caps: &Captures<'_>| {
        let index = match caps.get(1).map(|m| m.as_str()) {
            Some(digits) if !digits.is_empty() => {
                digits.parse::<usize>().unwrap_or(0).wrapping_sub(1)
            }
            _ => {
                next += 1;
                next - 1
            }
        };
        if let Some(value) = params.get(index) {
            literal(value)
        } else {
            in_range = false;
            String::new()
        }
    });
    if in_range {
        formatted.into_owned()
    } else {
        fallback()
    }
}

fn single_line(sql: &str) -> String {
    let mut cmd = sql.to_string();
    if let Some(re) = comment_lines() {
        cmd = re.replace_all(&cmd, " ").into_owned();
    }
    if let Some(re) = whitespace() {
        cmd = re.replace_all(&cmd, " ").into_owned();
    }
    cmd
}

/// Like [`format_sql_for_log`] for statements with `:name` parameters.
///
/// Every `:name` must have an entry in `params`; otherwise the statement
/// is followed by the parameter map instead. Unused entries are allowed.
pub fn format_named_sql_for_log(sql: &str, params: &BTreeMap<String, Value>) -> String {
    let cmd = single_line(sql);
    if params.is_empty() {
        return cmd;
    }

    let fallback = || {
        let entries: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("'{name}': {}", literal(value)))
            .collect();
        format!("{cmd}, {{{}}}", entries.join(", "))
    };

    let Some(re) = named_placeholders() else {
        return fallback();
    };
    let mut complete = true;
    let formatted = re.replace_all(&cmd, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1) else {
            return caps[0].to_string();
        };
        if let Some(value) = params.get(name.as_str()) {
            literal(value)
        } else {
            complete = false;
            String::new()
        }
    });
    if complete {
        formatted.into_owned()
    } else {
        fallback()
    }
}

/// Emit a statement at debug level.
pub fn log_sql(sql: &str, params: &[Value], dialect: Dialect) {
    tracing::debug!(
        target: "uniquery::sql",
        dialect = %dialect,
        sql = %format_sql_for_log(sql, params, dialect),
        "Executing SQL"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comments_and_whitespace() {
        let sql = "-- all cars\nSELECT *\n    FROM cars -- trailing\n  WHERE 1";
        assert_eq!(
            format_sql_for_log(sql, &[], Dialect::Sqlite),
            " SELECT * FROM cars -- trailing WHERE 1"
        );
    }

    #[test]
    fn test_inlines_parameters() {
        let sql = "SELECT * FROM cars WHERE name = ?1 AND year > ?2 AND notes IS ?3";
        let params = vec![Value::from("O'Brien\\x"), Value::Int(2020), Value::Null];
        assert_eq!(
            format_sql_for_log(sql, &params, Dialect::Sqlite),
            "SELECT * FROM cars WHERE name = 'O''Brien\\\\x' AND year > 2020 AND notes IS NULL"
        );
    }

    #[test]
    fn test_numbered_and_positional() {
        let params = vec![Value::Int(1), Value::from("a")];
        assert_eq!(
            format_sql_for_log("UPDATE t SET a = $2 WHERE id = $1", &params, Dialect::Postgres),
            "UPDATE t SET a = 'a' WHERE id = 1"
        );
        assert_eq!(
            format_sql_for_log("UPDATE t SET a = ? WHERE id = ?", &params, Dialect::Mysql),
            "UPDATE t SET a = 1 WHERE id = 'a'"
        );
    }

    #[test]
    fn test_named_parameters() {
        let params = BTreeMap::from([
            ("make".to_string(), Value::from("Volvo")),
            ("year".to_string(), Value::Int(2019)),
        ]);
        assert_eq!(
            format_named_sql_for_log(
                "SELECT id::text FROM cars\n WHERE make = :make AND year >= :year",
                &params
            ),
            "SELECT id::text FROM cars WHERE make = 'Volvo' AND year >= 2019"
        );
        assert_eq!(
            format_named_sql_for_log("SELECT * FROM cars WHERE make = :model", &params),
            "SELECT * FROM cars WHERE make = :model, {'make': 'Volvo', 'year': 2019}"
        );
        assert_eq!(
            format_named_sql_for_log("SELECT 1", &BTreeMap::new()),
            "SELECT 1"
        );
    }

    #[test]
    fn test_count_mismatch_falls_back() {
        let params = vec![Value::Int(1), Value::from("x")];
        assert_eq!(
            format_sql_for_log("DELETE FROM t WHERE id = ?1", &params, Dialect::Sqlite),
            "DELETE FROM t WHERE id = ?1, [1, 'x']"
        );
        assert_eq!(
            format_sql_for_log("DELETE FROM t WHERE id = ?1 OR id = ?5", &params, Dialect::Sqlite),
            "DELETE FROM t WHERE id = ?1 OR id = ?5, [1, 'x']"
        );
    }
}
