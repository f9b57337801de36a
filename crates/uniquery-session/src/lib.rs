//! Query hydration for UniQuery.
//!
//! `uniquery-session` is the **per-query layer**. It turns the flat rows of
//! an SQL join into deduplicated, linked model instances, using the
//! relation graph produced by `uniquery-schema`.
//!
//! # Role In The Architecture
//!
//! - **Query plan**: groups analyzed output columns per participating table.
//! - **Identity map**: one instance per primary key, per table, per query.
//! - **Hydration**: fills fields and links many-to-one, one-to-many and
//!   many-to-many relations between the instances of one result.
//! - **Write path**: renders INSERT/upsert/DELETE statements for instances.
//!
//! # Design
//!
//! - **No global state**: models live in an explicit [`ModelRegistry`].
//! - **Index links**: relation attributes are [`InstanceRef`]s into the
//!   result's identity maps; instances never own each other.
//! - **No I/O**: rows are fetched and statements executed by the caller.
//!
//! # Example
//!
//! ```ignore
//! let registry = ModelRegistry::from_graph(graph);
//! let result = Hydrator::new(&registry).hydrate_query(&analyzer, sql, &params, &rows)?;
//!
//! for car in result.list("cars").unwrap_or_default() {
//!     for client in result.many(car, "clients").unwrap_or_default() {
//!         println!("{car} -> {client}");
//!     }
//! }
//! ```

pub mod analysis;
pub mod hydrate;
pub mod identity_map;
pub mod instance;
pub mod registry;
pub mod result;
pub mod sqllog;
pub mod write;

pub use analysis::{PlannedTable, QueryPlan, SelectedColumn, SqlAnalyzer};
pub use hydrate::{HydrationConfig, Hydrator};
pub use identity_map::IdentityMap;
pub use instance::{Instance, InstanceRef, Link};
pub use registry::{ModelEntry, ModelRegistry, PostInitHook};
pub use result::{QueryResult, TableResult};
pub use sqllog::{format_named_sql_for_log, format_sql_for_log, log_sql};
pub use write::{BatchStatement, Statement, StatementBuilder, create_record};
