//! Query hydration: flat result rows in, linked instances out.
//!
//! Hydration runs in stages, each finished for every table before the next
//! starts:
//!
//! 1. Row-width check
//! 2. Row intake into per-table identity maps
//! 3. Field population
//! 4. Relation-collection initialization
//! 5. Many-to-one / one-to-many linking
//! 6. Many-to-many linking through queried link tables
//! 7. Result assembly
//! 8. Row-usage check
//! 9. Post-init hooks
//!
//! Hydration performs no I/O. Rows come from the caller's driver.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uniquery_core::{ColumnInfo, Error, Key, QueryError, QueryErrorKind, Result, Row, Value};
use uniquery_schema::{RelationOne, RelationRef};

use crate::analysis::{PlannedTable, QueryPlan, SqlAnalyzer};
use crate::identity_map::IdentityMap;
use crate::instance::{Instance, InstanceRef, Link};
use crate::registry::{ModelEntry, ModelRegistry};
use crate::result::{QueryResult, TableResult};
use crate::sqllog::log_sql;

/// Hydration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Log every hydrated query as one line with inlined parameters.
    pub log_sql: bool,
}

impl HydrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable SQL logging (builder pattern).
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }
}

/// Per-table working state of one hydration.
struct TableState<'a> {
    planned: &'a PlannedTable,
    entry: &'a ModelEntry,
    columns: Arc<ColumnInfo>,
    map: IdentityMap,
    /// Row index each instance was taken from.
    sources: Vec<usize>,
}

/// Turns result rows into a [`QueryResult`] using a model registry.
#[derive(Debug, Clone)]
pub struct Hydrator<'r> {
    registry: &'r ModelRegistry,
    config: HydrationConfig,
}

impl<'r> Hydrator<'r> {
    pub fn new(registry: &'r ModelRegistry) -> Self {
        Self {
            registry,
            config: HydrationConfig::default(),
        }
    }

    /// Replace the configuration (builder pattern).
    pub fn with_config(mut self, config: HydrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    /// Hydrate the rows of `sql`, resolving its columns with `analyzer`.
    ///
    /// `params` are only used for logging.
    pub fn hydrate_query<A: SqlAnalyzer + ?Sized>(
        &self,
        analyzer: &A,
        sql: &str,
        params: &[Value],
        rows: &[Vec<Value>],
    ) -> Result<QueryResult> {
        let dialect = self.registry.dialect();
        if self.config.log_sql {
            log_sql(sql, params, dialect);
        }
        let columns = analyzer.analyze(sql, dialect, self.registry.graph())?;
        let plan = QueryPlan::from_columns(self.registry, &columns)?;
        self.hydrate(&plan, rows)
    }

    /// Hydrate rows made of the full column lists of `tables`, side by side.
    pub fn hydrate_tables(&self, tables: &[&str], rows: &[Vec<Value>]) -> Result<QueryResult> {
        let plan = QueryPlan::for_tables(self.registry, tables)?;
        self.hydrate(&plan, rows)
    }

    /// Hydrate rows according to `plan`.
    #[tracing::instrument(
        level = "debug",
        skip(self, plan, rows),
        fields(tables = plan.tables().len(), rows = rows.len())
    )]
    pub fn hydrate(&self, plan: &QueryPlan, rows: &[Vec<Value>]) -> Result<QueryResult> {
        check_width(plan, rows)?;

        let mut states = Vec::with_capacity(plan.tables().len());
        for planned in plan.tables() {
            states.push(TableState {
                planned,
                entry: self.registry.lookup(&planned.table_name)?,
                columns: planned.column_info(),
                map: IdentityMap::new(),
                sources: Vec::new(),
            });
        }

        intake_rows(&mut states, rows);
        tracing::debug!(
            instances = states.iter().map(|s| s.map.len()).sum::<usize>(),
            "Row intake complete"
        );

        populate_fields(&mut states, rows);
        init_collections(&mut states, plan);
        link_one_many(&mut states, plan)?;
        tracing::debug!("One-to-many relations linked");
        link_many_many(&mut states, plan);
        tracing::debug!("Many-to-many relations linked");

        let hooks: Vec<_> = states.iter().map(|s| s.entry.post_init().cloned()).collect();
        let mut result = QueryResult {
            tables: states
                .into_iter()
                .map(|state| TableResult {
                    descriptor: Arc::clone(state.entry.descriptor()),
                    table_alias: state.planned.table_alias.clone(),
                    instances: state.map,
                })
                .collect(),
        };

        let used = result.instance_count();
        if used < rows.len() {
            return Err(Error::Query(QueryError::new(
                QueryErrorKind::UnusedRows,
                format!(
                    "The query returned {} rows, but only {used} rows were used. Perhaps the query returned many duplicated rows?",
                    rows.len()
                ),
            )));
        }

        for (table, hook) in result.tables.iter_mut().zip(hooks) {
            let Some(hook) = hook else {
                continue;
            };
            tracing::trace!(table = %table.table_name(), "Running post-init hook");
            for instance in table.instances.instances_mut() {
                hook(instance);
            }
        }

        tracing::info!(
            rows = rows.len(),
            tables = result.tables.len(),
            instances = used,
            "Query hydrated"
        );
        Ok(result)
    }
}

/// Stage 1: with a pinned table list every row must be exactly as wide as
/// the tables' columns together. Otherwise every row must reach the last
/// position the plan reads.
fn check_width(plan: &QueryPlan, rows: &[Vec<Value>]) -> Result<()> {
    if plan.is_pinned() {
        let expected = plan.column_count();
        return match rows.iter().find(|row| row.len() != expected) {
            Some(row) => Err(Error::Query(QueryError::new(
                QueryErrorKind::WrongNumberOfColumns,
                format!(
                    "The total number of columns in the provided list of models ({expected}) does not match the number of columns in the query result ({})",
                    row.len()
                ),
            ))),
            None => Ok(()),
        };
    }
    let required = plan.min_row_width();
    match rows.iter().position(|row| row.len() < required) {
        Some(index) => {
            tracing::warn!(row = index, width = rows[index].len(), required, "Result row too short");
            Err(Error::Query(QueryError::new(
                QueryErrorKind::WrongNumberOfColumns,
                format!(
                    "The analyzed query selects {required} columns, but row {index} of the query result has only {}",
                    rows[index].len()
                ),
            )))
        }
        None => Ok(()),
    }
}

/// Stage 2: one instance per distinct non-NULL primary key and table.
fn intake_rows(states: &mut [TableState<'_>], rows: &[Vec<Value>]) {
    for (row_index, row) in rows.iter().enumerate() {
        for state in states.iter_mut() {
            let pk_position = state.planned.pk_position;
            let Some(key) = row.get(pk_position).and_then(Key::new) else {
                continue;
            };
            if state.map.contains_key(&key) {
                continue;
            }
            let mut values = vec![Value::Null; state.columns.len()];
            if let Some(slot) = state
                .planned
                .columns
                .iter()
                .position(|(position, _)| *position == pk_position)
            {
                values[slot] = row[pk_position].clone();
            }
            let instance = Instance::new(
                Arc::clone(state.entry.descriptor()),
                Row::with_columns(Arc::clone(&state.columns), values),
            );
            state.map.insert(key, instance);
            state.sources.push(row_index);
        }
    }
}

/// Stage 3: copy each instance's columns out of the row it came from.
fn populate_fields(states: &mut [TableState<'_>], rows: &[Vec<Value>]) {
    for state in states.iter_mut() {
        let planned = state.planned;
        for (instance, &source) in state.map.instances_mut().iter_mut().zip(&state.sources) {
            let row = &rows[source];
            let values = planned
                .columns
                .iter()
                .map(|(position, _)| row.get(*position).cloned().unwrap_or(Value::Null))
                .collect();
            instance.set_row(Row::with_columns(Arc::clone(&state.columns), values));
        }
    }
}

/// Stage 4: empty lists for every one-to-many relation, and for every
/// many-to-many relation whose link table is part of the query.
fn init_collections(states: &mut [TableState<'_>], plan: &QueryPlan) {
    for state in states.iter_mut() {
        let initial: Vec<bool> = state
            .entry
            .descriptor()
            .relations()
            .map(|relation| match relation {
                RelationRef::One(_) => false,
                RelationRef::Many(_) => true,
                RelationRef::ManyMany(r) => plan.contains_table(&r.link_table),
            })
            .collect();
        for instance in state.map.instances_mut() {
            for (slot, _) in initial.iter().enumerate().filter(|(_, init)| **init) {
                instance.set_slot(slot, Link::Many(Vec::new()));
            }
        }
    }
}

/// Identity-map positions in `target` referenced by each instance of
/// `source` through `relation`.
fn resolve_foreign_keys(
    source: &TableState<'_>,
    target: &TableState<'_>,
    relation: &RelationOne,
) -> Result<Vec<Option<usize>>> {
    if source.map.is_empty() {
        return Ok(Vec::new());
    }
    if !source.columns.contains(&relation.from_column) {
        return Err(Error::Query(
            QueryError::new(
                QueryErrorKind::MissingColumn,
                format!(
                    "Column \"{}\" must be included in queries involving table \"{}\"",
                    relation.from_column, source.planned.table_name
                ),
            )
            .with_table(&source.planned.table_name)
            .with_column(&relation.from_column),
        ));
    }
    Ok(source
        .map
        .iter()
        .map(|instance| {
            instance
                .value(&relation.from_column)
                .and_then(Key::new)
                .and_then(|key| target.map.position_of_key(&key))
        })
        .collect())
}

/// Stage 5: set every many-to-one attribute whose target table was queried
/// and append the instance to the target's reciprocal list.
fn link_one_many(states: &mut [TableState<'_>], plan: &QueryPlan) -> Result<()> {
    for a in 0..states.len() {
        let descriptor = Arc::clone(states[a].entry.descriptor());
        for (slot, relation) in descriptor.relations().enumerate() {
            let RelationRef::One(relation) = relation else {
                continue;
            };
            let Some(b) = plan.table_index(&relation.to_table) else {
                continue;
            };
            let targets = resolve_foreign_keys(&states[a], &states[b], relation)?;
            let reciprocal = states[b]
                .entry
                .descriptor()
                .attribute_slot(&relation.other_attribute_name);

            for (index, target) in targets.into_iter().enumerate() {
                let target_ref = target.map(|t| InstanceRef { table: b, index: t });
                if let Some(instance) = states[a].map.at_mut(index) {
                    instance.set_slot(slot, Link::One(target_ref));
                }
                if let (Some(t), Some(reciprocal)) = (target, reciprocal) {
                    if let Some(target_instance) = states[b].map.at_mut(t) {
                        target_instance.push_to_slot(reciprocal, InstanceRef { table: a, index });
                    }
                }
            }
            tracing::trace!(
                table = %descriptor.table_name,
                attribute = %relation.attribute_name,
                "Linked many-to-one relation"
            );
        }
    }
    Ok(())
}

/// Stage 6: follow link-table instances to the far endpoint.
fn link_many_many(states: &mut [TableState<'_>], plan: &QueryPlan) {
    for a in 0..states.len() {
        let descriptor = Arc::clone(states[a].entry.descriptor());
        for (slot, relation) in descriptor.relations().enumerate() {
            let RelationRef::ManyMany(relation) = relation else {
                continue;
            };
            let (Some(link), Some(_)) = (
                plan.table_index(&relation.link_table),
                plan.table_index(&relation.to_table),
            ) else {
                continue;
            };

            // Our one-to-many list of link rows, and the link rows'
            // many-to-one attribute pointing at the far endpoint.
            let Some(link_slot) = descriptor
                .relations_many
                .get(&relation.link_table)
                .and_then(|list| list.iter().find(|r| r.from_column == relation.from_column))
                .and_then(|r| descriptor.attribute_slot(&r.attribute_name))
            else {
                continue;
            };
            let link_descriptor = states[link].entry.descriptor();
            let Some(target_slot) = link_descriptor
                .relations_one
                .get(&relation.to_table)
                .and_then(|list| list.iter().find(|r| r.from_column == relation.to_column))
                .and_then(|r| link_descriptor.attribute_slot(&r.attribute_name))
            else {
                continue;
            };

            let reached: Vec<Vec<InstanceRef>> = states[a]
                .map
                .iter()
                .map(|instance| {
                    let Some(Link::Many(link_refs)) = instance.slot(link_slot) else {
                        return Vec::new();
                    };
                    link_refs
                        .iter()
                        .filter_map(|link_ref| {
                            let link_instance = states.get(link_ref.table)?.map.at(link_ref.index)?;
                            match link_instance.slot(target_slot)? {
                                Link::One(target) => *target,
                                Link::Many(_) => None,
                            }
                        })
                        .collect()
                })
                .collect();

            for (index, targets) in reached.into_iter().enumerate() {
                if let Some(instance) = states[a].map.at_mut(index) {
                    instance.set_slot(slot, Link::Many(targets));
                }
            }
        }
    }
}
