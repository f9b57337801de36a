//! UniQuery - relation inference and join-result hydration for SQL schemas.
//!
//! UniQuery provides:
//!
//! - Relation inference: a uniquely named relationship graph derived from
//!   foreign keys, including many-to-many shortcuts through link tables
//! - Query hydration: flat join rows turned into deduplicated, linked
//!   model instances
//! - Statement builders for saving and deleting instances
//!
//! # Quick Start
//!
//! ```ignore
//! use uniquery::prelude::*;
//!
//! // Once, at build or startup time
//! let config = InferenceConfig::new().rename("cars__car_id__clients_cars__clients__client_id", "owners");
//! let graph = RelationGraph::infer(&introspector, &config)?;
//! let registry = ModelRegistry::from_graph(graph);
//!
//! // Per query; rows come from your driver
//! let result = Hydrator::new(&registry).hydrate_query(&analyzer, sql, &params, &rows)?;
//! for car in result.list("cars").unwrap_or_default() {
//!     let owners = result.many(car, "owners").unwrap_or_default();
//!     println!("{car}: {} owners", owners.len());
//! }
//! ```
//!
//! # Layout
//!
//! - `uniquery-core`: values, rows, errors, dialects, naming
//! - `uniquery-schema`: introspection and relation inference
//! - `uniquery-session`: query plans, identity maps, hydration, statements

pub use uniquery_core::inflect;
pub use uniquery_core::{
    ConfigError, Dialect, Error, FromValue, Key, Model, QueryError, QueryErrorKind, Result, Row,
    SchemaError, SchemaErrorKind, TypeError, Value, WriteError, WriteErrorKind,
};

pub use uniquery_schema::{
    ColumnDef, ColumnDescriptor, DatabaseSchema, ForeignKeyDef, InferenceConfig, LinkTablePolicy,
    RelationGraph, RelationKind, RelationMany, RelationManyMany, RelationOne, RelationRef,
    ScalarType, SchemaIntrospector, StaticIntrospector, TableDef, TableDescriptor,
    infer_from_schema, infer_relations, introspect_all,
};

pub use uniquery_session::{
    BatchStatement, HydrationConfig, Hydrator, IdentityMap, Instance, InstanceRef, Link,
    ModelRegistry, QueryPlan, QueryResult, SelectedColumn, SqlAnalyzer, Statement,
    StatementBuilder, TableResult, create_record, format_named_sql_for_log, format_sql_for_log,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        // Core
        Dialect,
        Error,
        FromValue,
        // Hydration
        HydrationConfig,
        Hydrator,
        // Inference
        InferenceConfig,
        Instance,
        LinkTablePolicy,
        Model,
        ModelRegistry,
        QueryResult,
        RelationGraph,
        Result,
        Row,
        SchemaIntrospector,
        SelectedColumn,
        SqlAnalyzer,
        // Writes
        StatementBuilder,
        StaticIntrospector,
        TableDef,
        Value,
        create_record,
    };
}
