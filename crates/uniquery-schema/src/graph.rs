//! The relation graph: every table descriptor of a schema.

use crate::descriptor::TableDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uniquery_core::{Dialect, Error, Result, SchemaError, SchemaErrorKind};

/// Immutable result of relation inference, shared read-only by queries.
///
/// The graph serializes to JSON so it can be stored next to generated model
/// types and loaded at runtime without introspecting the database again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraph {
    pub dialect: Dialect,
    /// Descriptors keyed by table name.
    pub tables: BTreeMap<String, TableDescriptor>,
}

impl RelationGraph {
    pub fn new(dialect: Dialect, tables: BTreeMap<String, TableDescriptor>) -> Self {
        Self { dialect, tables }
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(name)
    }

    /// Get a table or fail with `TableNotFound`.
    pub fn require(&self, name: &str) -> Result<&TableDescriptor> {
        self.table(name).ok_or_else(|| {
            Error::Schema(
                SchemaError::new(
                    SchemaErrorKind::TableNotFound,
                    format!("Table \"{name}\" is not part of the relation graph"),
                )
                .with_table(name),
            )
        })
    }

    /// Find a table by its model (CamelCase) name.
    pub fn by_camel(&self, camel: &str) -> Option<&TableDescriptor> {
        self.tables.values().find(|t| t.camel == camel)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a graph previously written by [`RelationGraph::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use crate::infer::infer_relations;
    use crate::introspect::{StaticIntrospector, TableDef};

    fn graph() -> RelationGraph {
        let schema = StaticIntrospector::new(Dialect::Postgres)
            .table(
                TableDef::new("salesreps")
                    .primary_key("id", "text")
                    .column("name", "text"),
            )
            .table(
                TableDef::new("invoice")
                    .primary_key("id", "text")
                    .column("amount", "real")
                    .column("salesrep_id", "text")
                    .foreign_key("salesrep_id", "salesreps", "id"),
            );
        infer_relations(&schema, &InferenceConfig::default()).unwrap()
    }

    #[test]
    fn test_lookup() {
        let graph = graph();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.require("invoice").unwrap().camel, "Invoice");
        assert_eq!(graph.by_camel("Salesrep").unwrap().table_name, "salesreps");
        let err = graph.require("cars").unwrap_err();
        assert_eq!(err.schema_kind(), Some(SchemaErrorKind::TableNotFound));
    }

    #[test]
    fn test_json_round_trip() {
        let graph = graph();
        let json = graph.to_json().unwrap();
        let back = RelationGraph::from_json(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.dialect, Dialect::Postgres);

        let invoice = back.table("invoice").unwrap();
        assert_eq!(invoice.relations_one["salesreps"][0].attribute_name, "salesrep");
        assert_eq!(
            invoice.relations_one["salesreps"][0].other_attribute_name,
            "invoices"
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = RelationGraph::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }
}
