//! SQL analysis interface and query plans.
//!
//! Hydration never parses SQL itself. An external [`SqlAnalyzer`] reports,
//! for every output column of a query, which table (if any) it comes from.
//! [`QueryPlan`] groups those columns per participating table.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uniquery_core::{ColumnInfo, Dialect, Error, QueryError, QueryErrorKind, Result};
use uniquery_schema::RelationGraph;

use crate::registry::ModelRegistry;

/// One output column of a query as reported by SQL analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedColumn {
    /// Source table, `None` for computed expressions.
    pub table_name: Option<String>,
    /// Alias of the source table when it differs from the table name.
    pub table_alias: Option<String>,
    pub column_name: String,
    pub column_alias: Option<String>,
    pub is_primary_key: bool,
}

impl SelectedColumn {
    /// A column read straight from `table`.
    pub fn table(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table_name: Some(table.into()),
            table_alias: None,
            column_name: column.into(),
            column_alias: None,
            is_primary_key: false,
        }
    }

    /// A computed expression (`count(*) AS n`), belonging to no table.
    pub fn computed(name: impl Into<String>) -> Self {
        Self {
            table_name: None,
            table_alias: None,
            column_name: name.into(),
            column_alias: None,
            is_primary_key: false,
        }
    }

    /// Mark the column as its table's primary key (builder pattern).
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Set the table alias (builder pattern).
    pub fn with_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    /// Set the column alias (builder pattern).
    pub fn with_column_alias(mut self, alias: impl Into<String>) -> Self {
        self.column_alias = Some(alias.into());
        self
    }

    /// Name of the column in the result set.
    pub fn output_name(&self) -> &str {
        self.column_alias.as_deref().unwrap_or(&self.column_name)
    }
}

/// Resolves the output columns of a query against a schema.
pub trait SqlAnalyzer {
    fn analyze(
        &self,
        sql: &str,
        dialect: Dialect,
        graph: &RelationGraph,
    ) -> Result<Vec<SelectedColumn>>;
}

impl<F> SqlAnalyzer for F
where
    F: Fn(&str, Dialect, &RelationGraph) -> Result<Vec<SelectedColumn>>,
{
    fn analyze(
        &self,
        sql: &str,
        dialect: Dialect,
        graph: &RelationGraph,
    ) -> Result<Vec<SelectedColumn>> {
        self(sql, dialect, graph)
    }
}

/// Columns of one participating table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTable {
    pub table_name: String,
    pub table_alias: Option<String>,
    /// `(row position, column name)` in position order.
    pub columns: Vec<(usize, String)>,
    /// Row position of the primary-key column.
    pub pk_position: usize,
}

impl PlannedTable {
    /// Row position of `column`, if the table selected it.
    pub fn position_of(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(_, name)| name == column)
            .map(|(position, _)| *position)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::new(ColumnInfo::new(
            self.columns.iter().map(|(_, name)| name.clone()).collect(),
        ))
    }
}

/// Participating tables of one query in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    tables: Vec<PlannedTable>,
    /// `(row position, output name)` of columns belonging to no table.
    computed: Vec<(usize, String)>,
    pinned: bool,
}

impl QueryPlan {
    /// Group analyzed columns per table.
    ///
    /// Computed columns (`count(*) AS n`, literals) are attached under their
    /// output name to every participating table, unless the table selects a
    /// column of that name itself.
    ///
    /// When the same name occurs twice for one table the first position is
    /// kept and later ones are ignored, so in `SELECT cars.*, cars.id AS id`
    /// the `id` field is read from `cars.*`. This applies to table and
    /// computed columns alike.
    pub fn from_columns(registry: &ModelRegistry, columns: &[SelectedColumn]) -> Result<Self> {
        let mut tables: Vec<PlannedTable> = Vec::new();
        let mut computed: Vec<(usize, String)> = Vec::new();
        for (position, column) in columns.iter().enumerate() {
            let Some(table_name) = column.table_name.as_deref() else {
                let name = column.output_name();
                if computed.iter().all(|(_, existing)| existing != name) {
                    computed.push((position, name.to_string()));
                }
                continue;
            };
            let index = match tables.iter().position(|t| t.table_name == table_name) {
                Some(index) => index,
                None => {
                    registry.descriptor(table_name)?;
                    tables.push(PlannedTable {
                        table_name: table_name.to_string(),
                        table_alias: column.table_alias.clone(),
                        columns: Vec::new(),
                        pk_position: 0,
                    });
                    tables.len() - 1
                }
            };
            let table = &mut tables[index];
            if table.position_of(&column.column_name).is_none() {
                table.columns.push((position, column.column_name.clone()));
            }
        }

        for table in &mut tables {
            let descriptor = registry.descriptor(&table.table_name)?;
            table.pk_position = table
                .position_of(&descriptor.primary_key)
                .ok_or_else(|| missing_primary_key(&table.table_name, &descriptor.primary_key))?;
            for (position, name) in &computed {
                if table.position_of(name).is_none() {
                    table.columns.push((*position, name.clone()));
                }
            }
            table.columns.sort_by_key(|(position, _)| *position);
        }

        Ok(Self {
            tables,
            computed,
            pinned: false,
        })
    }

    /// Plan for rows made of the full column lists of `tables`, side by side.
    ///
    /// Used for queries the analyzer cannot resolve (CTEs, unions): the row
    /// width is then checked against the summed column counts.
    pub fn for_tables(registry: &ModelRegistry, tables: &[&str]) -> Result<Self> {
        let mut planned = Vec::with_capacity(tables.len());
        let mut offset = 0;
        for &table_name in tables {
            let descriptor = registry.descriptor(table_name)?;
            let columns: Vec<(usize, String)> = descriptor
                .column_names()
                .enumerate()
                .map(|(i, name)| (offset + i, name.to_string()))
                .collect();
            offset += columns.len();
            let mut table = PlannedTable {
                table_name: table_name.to_string(),
                table_alias: None,
                columns,
                pk_position: 0,
            };
            table.pk_position = table
                .position_of(&descriptor.primary_key)
                .ok_or_else(|| missing_primary_key(table_name, &descriptor.primary_key))?;
            planned.push(table);
        }
        Ok(Self {
            tables: planned,
            computed: Vec::new(),
            pinned: true,
        })
    }

    pub fn tables(&self) -> &[PlannedTable] {
        &self.tables
    }

    pub fn table(&self, table_name: &str) -> Option<&PlannedTable> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    /// Index of `table_name` among the participating tables.
    pub fn table_index(&self, table_name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.table_name == table_name)
    }

    pub fn contains_table(&self, table_name: &str) -> bool {
        self.table_index(table_name).is_some()
    }

    /// Columns that belong to no table, as `(row position, output name)`.
    pub fn computed(&self) -> &[(usize, String)] {
        &self.computed
    }

    /// Number of columns claimed by all tables together.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(PlannedTable::column_count).sum()
    }

    /// Smallest row length that covers every planned position.
    pub fn min_row_width(&self) -> usize {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().map(|(position, _)| position + 1))
            .max()
            .unwrap_or(0)
    }

    /// Whether the plan was built from an explicit table list.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

fn missing_primary_key(table: &str, primary_key: &str) -> Error {
    Error::Query(
        QueryError::new(
            QueryErrorKind::MissingPrimaryKey,
            format!("Column \"{primary_key}\" must be included in queries involving table \"{table}\""),
        )
        .with_table(table)
        .with_column(primary_key),
    )
}
