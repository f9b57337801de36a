//! Table descriptors: the per-table half of the relation graph.

use crate::relation::{RelationMany, RelationManyMany, RelationOne, RelationRef};
use crate::types::ScalarType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column as seen by hydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub scalar_type: ScalarType,
}

/// Naming, columns and relations of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub table_name: String,
    pub singular: String,
    pub plural: String,
    /// Model name, CamelCase of the singular name.
    pub camel: String,
    pub primary_key: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Column names in the order they are shown by `Display`.
    pub field_priority: Vec<String>,
    /// Many-to-one relations keyed by referenced table.
    pub relations_one: BTreeMap<String, Vec<RelationOne>>,
    /// One-to-many relations keyed by referencing table.
    pub relations_many: BTreeMap<String, Vec<RelationMany>>,
    /// Many-to-many shortcuts keyed by the other endpoint.
    pub relations_many_many: BTreeMap<String, Vec<RelationManyMany>>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// SQL type declared for the primary-key column.
    pub fn primary_key_type(&self) -> &str {
        self.column(&self.primary_key)
            .map_or("", |c| c.sql_type.as_str())
    }

    /// All relations in slot order: many-to-one, one-to-many, then
    /// many-to-many, each grouped by related table name.
    pub fn relations(&self) -> impl Iterator<Item = RelationRef<'_>> {
        let one = self.relations_one.values().flatten().map(RelationRef::One);
        let many = self.relations_many.values().flatten().map(RelationRef::Many);
        let many_many = self
            .relations_many_many
            .values()
            .flatten()
            .map(RelationRef::ManyMany);
        one.chain(many).chain(many_many)
    }

    pub fn relation_count(&self) -> usize {
        self.relations().count()
    }

    /// Slot of the relation exposed under `attribute`.
    pub fn attribute_slot(&self, attribute: &str) -> Option<usize> {
        self.relations()
            .position(|r| r.attribute_name() == attribute)
    }

    /// Relation exposed under `attribute`.
    pub fn relation(&self, attribute: &str) -> Option<RelationRef<'_>> {
        self.relations().find(|r| r.attribute_name() == attribute)
    }

    /// Every candidate name of every relation, duplicates included.
    pub(crate) fn all_candidates(&self) -> Vec<&str> {
        self.relations()
            .flat_map(|r| r.candidates().iter().map(String::as_str))
            .collect()
    }
}

/// Order columns for display: names containing `name`, then names
/// containing `desc` or the primary key, then everything else.
pub(crate) fn field_priority(columns: &[ColumnDescriptor], primary_key: &str) -> Vec<String> {
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut rest = Vec::new();
    for column in columns {
        let name = column.name.clone();
        if name.contains("name") {
            first.push(name);
        } else if name.contains("desc") || name == primary_key {
            second.push(name);
        } else {
            rest.push(name);
        }
    }
    first.extend(second);
    first.extend(rest);
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            sql_type: "TEXT".to_string(),
            scalar_type: ScalarType::Text,
        }
    }

    #[test]
    fn test_field_priority() {
        let columns = vec![
            col("id"),
            col("amount"),
            col("description"),
            col("first_name"),
            col("year"),
            col("last_name"),
        ];
        assert_eq!(
            field_priority(&columns, "id"),
            vec!["first_name", "last_name", "id", "description", "amount", "year"]
        );
    }

    #[test]
    fn test_part_priority() {
        let columns = vec![col("part_number"), col("description")];
        assert_eq!(
            field_priority(&columns, "part_number"),
            vec!["part_number", "description"]
        );
    }
}
