//! Database introspection.
//!
//! Relation inference only needs three facts per table: its columns, which
//! column is the primary key, and its foreign keys. Drivers expose them
//! through [`SchemaIntrospector`]; [`StaticIntrospector`] holds a schema
//! assembled by hand.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uniquery_core::{Dialect, Error, Result, SchemaError, SchemaErrorKind};

// ============================================================================
// Schema Types
// ============================================================================

/// Information about a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// SQL type as declared
    pub sql_type: String,
    /// Whether this column is the primary key
    pub is_primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            is_primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

/// Information about a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Local column name
    pub local_column: String,
    /// Referenced table
    pub target_table: String,
    /// Referenced column
    pub target_column: String,
}

impl ForeignKeyDef {
    pub fn new(
        local_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            local_column: local_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }
}

/// Information about a database table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    /// Foreign key constraints
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Add the primary key column.
    pub fn primary_key(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, sql_type).primary_key());
        self
    }

    /// Add a regular column.
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, sql_type));
        self
    }

    /// Add a foreign key from `local_column` to `target_table.target_column`.
    pub fn foreign_key(
        mut self,
        local_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .push(ForeignKeyDef::new(local_column, target_table, target_column));
        self
    }

    /// Get a column by name.
    pub fn column_def(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Complete representation of a database schema.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSchema {
    /// All tables in the schema, keyed by table name
    pub tables: BTreeMap<String, TableDef>,
    /// Database dialect
    pub dialect: Dialect,
}

impl DatabaseSchema {
    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Get all table names.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

// ============================================================================
// Introspection
// ============================================================================

/// Source of schema metadata, usually backed by a live connection.
pub trait SchemaIntrospector {
    /// Dialect of the database being described.
    fn dialect(&self) -> Dialect;

    /// List all table names in the database.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of `table` in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnDef>>;

    /// Foreign keys declared on `table`.
    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDef>>;
}

/// Introspect the entire database schema.
pub fn introspect_all(introspector: &dyn SchemaIntrospector) -> Result<DatabaseSchema> {
    let mut schema = DatabaseSchema {
        tables: BTreeMap::new(),
        dialect: introspector.dialect(),
    };

    for name in introspector.list_tables()? {
        let columns = introspector.columns(&name)?;
        let foreign_keys = introspector.foreign_keys(&name)?;
        tracing::trace!(
            table = %name,
            columns = columns.len(),
            foreign_keys = foreign_keys.len(),
            "Introspected table"
        );
        schema.tables.insert(
            name.clone(),
            TableDef {
                name,
                columns,
                foreign_keys,
            },
        );
    }

    Ok(schema)
}

/// In-memory schema, built table by table.
///
/// # Example
///
/// ```ignore
/// let schema = StaticIntrospector::new(Dialect::Sqlite)
///     .table(TableDef::new("salesreps").primary_key("id", "TEXT").column("name", "TEXT"))
///     .table(
///         TableDef::new("invoice")
///             .primary_key("id", "TEXT")
///             .column("salesrep_id", "INTEGER")
///             .foreign_key("salesrep_id", "salesreps", "id"),
///     );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIntrospector {
    dialect: Dialect,
    tables: Vec<TableDef>,
}

impl StaticIntrospector {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
        }
    }

    /// Add a table, replacing any earlier table with the same name.
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self
    }

    fn find(&self, table: &str) -> Result<&TableDef> {
        self.tables.iter().find(|t| t.name == table).ok_or_else(|| {
            Error::Schema(
                SchemaError::new(
                    SchemaErrorKind::TableNotFound,
                    format!("Table \"{table}\" does not exist"),
                )
                .with_table(table),
            )
        })
    }
}

impl SchemaIntrospector for StaticIntrospector {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnDef>> {
        Ok(self.find(table)?.columns.clone())
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDef>> {
        Ok(self.find(table)?.foreign_keys.clone())
    }
}
