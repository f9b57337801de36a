//! Statement builders for persisting instances.
//!
//! Builders only render SQL and parameters; executing them (and reading
//! back generated keys) belongs to the database driver.

use std::fmt;
use uniquery_core::{
    Dialect, Error, QueryError, QueryErrorKind, Result, Row, Value, WriteError, WriteErrorKind,
};
use uniquery_schema::TableDescriptor;

use crate::instance::Instance;
use crate::registry::ModelRegistry;

/// A single statement with positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// One statement executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub sql: String,
    pub rows: Vec<Vec<Value>>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Renders INSERT, upsert, SELECT and DELETE statements for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementBuilder {
    dialect: Dialect,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn placeholders(&self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|i| self.dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Statement persisting `instance`.
    ///
    /// A NULL primary key means a new row: the key column is left out so
    /// the database generates it, which requires the dialect's
    /// auto-increment type. A present key produces an upsert.
    pub fn save(&self, instance: &Instance) -> Result<Statement> {
        let descriptor = instance.descriptor();
        let primary_key = descriptor.primary_key.as_str();
        let primary_key_value = instance.primary_key_value().clone();
        let is_new = primary_key_value.is_null();

        if is_new && !self.dialect.is_autoincrement(descriptor.primary_key_type()) {
            return Err(Error::Write(WriteError {
                kind: WriteErrorKind::MissingId,
                message: format!(
                    "Impossible to create an instance of type \"{}\" without id because the id is not autoincrement.",
                    descriptor.table_name
                ),
                table: descriptor.table_name.clone(),
            }));
        }

        let mut columns = Vec::new();
        let mut values = Vec::new();
        for column in descriptor.column_names() {
            let Some(value) = instance.value(column) else {
                continue;
            };
            if column == primary_key && is_new {
                continue;
            }
            columns.push(column);
            values.push(value.clone());
        }

        let statement = if is_new {
            self.insert(descriptor, &columns, values)
        } else {
            self.upsert(descriptor, &columns, values, primary_key_value)
        };
        tracing::trace!(table = %descriptor.table_name, sql = %statement.sql, "Built save statement");
        Ok(statement)
    }

    fn returning(&self, descriptor: &TableDescriptor) -> String {
        if self.dialect.supports_returning() {
            format!(
                " RETURNING {}.{}",
                self.quote(&descriptor.table_name),
                self.quote(&descriptor.primary_key)
            )
        } else {
            String::new()
        }
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn insert(&self, descriptor: &TableDescriptor, columns: &[&str], values: Vec<Value>) -> Statement {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            self.quote(&descriptor.table_name),
            self.column_list(columns),
            self.placeholders(1, columns.len()),
            self.returning(descriptor)
        );
        Statement { sql, params: values }
    }

    fn upsert(
        &self,
        descriptor: &TableDescriptor,
        columns: &[&str],
        mut values: Vec<Value>,
        primary_key_value: Value,
    ) -> Statement {
        let table = self.quote(&descriptor.table_name);
        let primary_key = self.quote(&descriptor.primary_key);
        let insert = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            self.column_list(columns),
            self.placeholders(1, columns.len())
        );

        if self.dialect == Dialect::Mysql {
            let assignments = columns
                .iter()
                .map(|c| format!("{0} = VALUES({0})", self.quote(c)))
                .collect::<Vec<_>>()
                .join(", ");
            return Statement {
                sql: format!("{insert} ON DUPLICATE KEY UPDATE {assignments}"),
                params: values,
            };
        }

        let assignments = columns
            .iter()
            .map(|c| format!("{0} = excluded.{0}", self.quote(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "{insert} ON CONFLICT({primary_key}) DO UPDATE SET {assignments} WHERE {table}.{primary_key} = {}{}",
            self.dialect.placeholder(columns.len() + 1),
            self.returning(descriptor)
        );
        values.push(primary_key_value);
        Statement { sql, params: values }
    }

    /// `SELECT *` of the row with the given primary key.
    pub fn select_by_primary_key(
        &self,
        descriptor: &TableDescriptor,
        primary_key_value: impl Into<Value>,
    ) -> Statement {
        Statement {
            sql: format!(
                "SELECT * FROM {} WHERE {} = {}",
                self.quote(&descriptor.table_name),
                self.quote(&descriptor.primary_key),
                self.dialect.placeholder(1)
            ),
            params: vec![primary_key_value.into()],
        }
    }

    /// DELETE of the row with the given primary key.
    pub fn delete_by_primary_key(
        &self,
        descriptor: &TableDescriptor,
        primary_key_value: impl Into<Value>,
    ) -> Statement {
        Statement {
            sql: format!(
                "DELETE FROM {} WHERE {} = {}",
                self.quote(&descriptor.table_name),
                self.quote(&descriptor.primary_key),
                self.dialect.placeholder(1)
            ),
            params: vec![primary_key_value.into()],
        }
    }

    /// One INSERT executed for every row of `rows`.
    pub fn insert_many(
        &self,
        descriptor: &TableDescriptor,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<BatchStatement> {
        if let Some(unknown) = columns.iter().find(|c| !descriptor.has_column(c)) {
            return Err(column_not_found(&descriptor.table_name, unknown));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(Error::Query(
                QueryError::new(
                    QueryErrorKind::WrongNumberOfColumns,
                    format!(
                        "Insert into \"{}\" names {} columns but a row has {} values",
                        descriptor.table_name,
                        columns.len(),
                        row.len()
                    ),
                )
                .with_table(&descriptor.table_name),
            ));
        }
        Ok(BatchStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.quote(&descriptor.table_name),
                self.column_list(columns),
                self.placeholders(1, columns.len())
            ),
            rows,
        })
    }

    /// DELETE statements for `instances`, one per table in order of first
    /// appearance. Instances without a primary key are skipped.
    pub fn delete_many<'a>(&self, instances: impl IntoIterator<Item = &'a Instance>) -> Vec<Statement> {
        let mut groups: Vec<(&TableDescriptor, Vec<Value>)> = Vec::new();
        for instance in instances {
            if instance.is_new() {
                continue;
            }
            let value = instance.primary_key_value().clone();
            match groups
                .iter_mut()
                .find(|(d, _)| d.table_name == instance.table_name())
            {
                Some((_, values)) => values.push(value),
                None => groups.push((instance.descriptor(), vec![value])),
            }
        }

        groups
            .into_iter()
            .map(|(descriptor, params)| Statement {
                sql: format!(
                    "DELETE FROM {} WHERE {} IN ({})",
                    self.quote(&descriptor.table_name),
                    self.quote(&descriptor.primary_key),
                    self.placeholders(1, params.len())
                ),
                params,
            })
            .collect()
    }
}

/// Build a detached instance of `table_name` from named values.
///
/// Every column of the table is present; columns not given are NULL. The
/// instance is not part of any query result and has no relation attributes.
pub fn create_record<'v>(
    registry: &ModelRegistry,
    table_name: &str,
    values: impl IntoIterator<Item = (&'v str, Value)>,
) -> Result<Instance> {
    let descriptor = registry.descriptor(table_name)?.clone();
    let names: Vec<String> = descriptor.column_names().map(str::to_string).collect();
    let mut row = Row::new(names.clone(), vec![Value::Null; names.len()]);
    for (column, value) in values {
        if !row.set_by_name(column, value) {
            return Err(column_not_found(table_name, column));
        }
    }
    Ok(Instance::new(descriptor, row))
}

fn column_not_found(table: &str, column: &str) -> Error {
    Error::Query(
        QueryError::new(
            QueryErrorKind::ColumnNotFound,
            format!("Column \"{column}\" does not exist in table \"{table}\""),
        )
        .with_table(table)
        .with_column(column),
    )
}
