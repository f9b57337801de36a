//! Schema introspection and relation inference for UniQuery.
//!
//! This crate provides:
//! - The `SchemaIntrospector` interface and an in-memory implementation
//! - SQL type parsing and scalar type mapping
//! - Table descriptors with naming, columns and relations
//! - The relation inference engine producing a `RelationGraph`
//! - JSON persistence of the relation graph

pub mod config;
pub mod descriptor;
pub mod graph;
pub mod infer;
pub mod introspect;
pub mod relation;
pub mod types;

pub use config::{InferenceConfig, LinkTablePolicy};
pub use descriptor::{ColumnDescriptor, TableDescriptor};
pub use graph::RelationGraph;
pub use infer::{infer_from_schema, infer_relations};
pub use introspect::{
    ColumnDef, DatabaseSchema, ForeignKeyDef, SchemaIntrospector, StaticIntrospector, TableDef,
    introspect_all,
};
pub use relation::{RelationKind, RelationMany, RelationManyMany, RelationOne, RelationRef};
pub use types::{ParsedSqlType, ScalarType};

use uniquery_core::Result;

impl RelationGraph {
    /// Introspect a database and infer its relation graph.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = InferenceConfig::new()
    ///     .rename("parts__part_number__bom_link__parent", "children_links");
    /// let graph = RelationGraph::infer(&introspector, &config)?;
    /// std::fs::write("relations.json", graph.to_json()?)?;
    /// ```
    pub fn infer(introspector: &dyn SchemaIntrospector, config: &InferenceConfig) -> Result<Self> {
        infer_relations(introspector, config)
    }
}
