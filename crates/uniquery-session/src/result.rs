//! Hydrated query results.

use std::fmt;
use std::sync::Arc;
use uniquery_core::{Model, Result};
use uniquery_schema::TableDescriptor;

use crate::identity_map::IdentityMap;
use crate::instance::{Instance, InstanceRef, Link};

/// Instances of one participating table.
#[derive(Debug, Clone)]
pub struct TableResult {
    pub(crate) descriptor: Arc<TableDescriptor>,
    pub(crate) table_alias: Option<String>,
    pub(crate) instances: IdentityMap,
}

impl TableResult {
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn table_name(&self) -> &str {
        &self.descriptor.table_name
    }

    /// Name the table is exposed under, e.g. `cars`.
    pub fn plural(&self) -> &str {
        &self.descriptor.plural
    }

    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// Instances in first-appearance order.
    pub fn instances(&self) -> &[Instance] {
        self.instances.instances()
    }

    /// Primary-key map of the instances.
    pub fn identity_map(&self) -> &IdentityMap {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Everything one query produced, table by table.
///
/// Tables keep the order in which they first appear in the select list.
/// Relation attributes of the instances are [`InstanceRef`]s into this
/// result; [`QueryResult::one`] and [`QueryResult::many`] resolve them.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub(crate) tables: Vec<TableResult>,
}

impl QueryResult {
    pub fn tables(&self) -> &[TableResult] {
        &self.tables
    }

    /// Table by table name.
    pub fn table(&self, table_name: &str) -> Option<&TableResult> {
        self.tables.iter().find(|t| t.table_name() == table_name)
    }

    /// Instance list exposed under a plural name, e.g. `list("cars")`.
    pub fn list(&self, plural: &str) -> Option<&[Instance]> {
        self.by_plural(plural).map(TableResult::instances)
    }

    /// Primary-key map exposed under a plural name (`cars_dict`).
    pub fn dict(&self, plural: &str) -> Option<&IdentityMap> {
        self.by_plural(plural).map(TableResult::identity_map)
    }

    fn by_plural(&self, plural: &str) -> Option<&TableResult> {
        self.tables.iter().find(|t| t.plural() == plural)
    }

    /// Resolve a reference produced by this result.
    pub fn get(&self, reference: InstanceRef) -> Option<&Instance> {
        self.tables.get(reference.table)?.instances.at(reference.index)
    }

    /// Target of a many-to-one attribute.
    ///
    /// `None` when the attribute is unknown, absent, not many-to-one, or
    /// its foreign key did not resolve.
    pub fn one(&self, instance: &Instance, attribute: &str) -> Option<&Instance> {
        match instance.link(attribute)? {
            Link::One(Some(target)) => self.get(*target),
            _ => None,
        }
    }

    /// Instances of a one-to-many or many-to-many attribute.
    ///
    /// `None` when the attribute is unknown, absent, or many-to-one.
    pub fn many(&self, instance: &Instance, attribute: &str) -> Option<Vec<&Instance>> {
        match instance.link(attribute)? {
            Link::Many(targets) => Some(targets.iter().filter_map(|r| self.get(*r)).collect()),
            Link::One(_) => None,
        }
    }

    /// Convert the instances of `M`'s table into typed records.
    ///
    /// A table that did not take part in the query yields no records.
    pub fn load<M: Model>(&self) -> Result<Vec<M>> {
        self.table(M::TABLE_NAME).map_or_else(
            || Ok(Vec::new()),
            |table| table.instances().iter().map(|i| M::from_row(i.row())).collect(),
        )
    }

    /// Number of instances across all tables.
    pub fn instance_count(&self) -> usize {
        self.tables.iter().map(TableResult::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_count() == 0
    }
}

impl fmt::Display for QueryResult {
    /// `<QueryResult cars 3, clients 2>`, listing non-empty tables only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<String> = self
            .tables
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| format!("{} {}", t.plural(), t.len()))
            .collect();
        if counts.is_empty() {
            write!(f, "<QueryResult empty>")
        } else {
            write!(f, "<QueryResult {}>", counts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = QueryResult::default();
        assert!(result.is_empty());
        assert_eq!(result.to_string(), "<QueryResult empty>");
        assert!(result.list("cars").is_none());
        assert!(result.get(InstanceRef { table: 0, index: 0 }).is_none());
    }
}
