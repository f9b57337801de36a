//! Model registry: which tables can be hydrated, and how.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uniquery_core::inflect::{to_camel_case, to_singular};
use uniquery_core::{ConfigError, Dialect, Error, Model, QueryError, QueryErrorKind, Result};
use uniquery_schema::{RelationGraph, TableDescriptor};

use crate::instance::Instance;

/// Hook run once per hydrated instance after all relations are linked.
pub type PostInitHook = Arc<dyn Fn(&mut Instance) + Send + Sync>;

/// A registered model: its descriptor and optional post-init hook.
#[derive(Clone)]
pub struct ModelEntry {
    descriptor: Arc<TableDescriptor>,
    post_init: Option<PostInitHook>,
}

impl ModelEntry {
    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.descriptor
    }

    pub fn post_init(&self) -> Option<&PostInitHook> {
        self.post_init.as_ref()
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("table", &self.descriptor.table_name)
            .field("post_init", &self.post_init.is_some())
            .finish()
    }
}

/// Models available to hydration, keyed by model (CamelCase) name.
///
/// The registry is an explicit value shared read-only by queries; nothing
/// is registered globally.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    graph: Arc<RelationGraph>,
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// An empty registry over `graph`; tables must be registered one by one.
    pub fn new(graph: RelationGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            models: BTreeMap::new(),
        }
    }

    /// A registry with a model for every table of `graph`.
    pub fn from_graph(graph: RelationGraph) -> Self {
        let models = graph
            .tables()
            .map(|descriptor| {
                (
                    descriptor.camel.clone(),
                    ModelEntry {
                        descriptor: Arc::new(descriptor.clone()),
                        post_init: None,
                    },
                )
            })
            .collect();
        Self {
            graph: Arc::new(graph),
            models,
        }
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn dialect(&self) -> Dialect {
        self.graph.dialect
    }

    /// Register the model of `table_name`.
    pub fn register_table(&mut self, table_name: &str) -> Result<()> {
        let descriptor = self.graph.require(table_name)?;
        tracing::debug!(table = table_name, model = %descriptor.camel, "Registering model");
        self.models
            .entry(descriptor.camel.clone())
            .or_insert_with(|| ModelEntry {
                descriptor: Arc::new(descriptor.clone()),
                post_init: None,
            });
        Ok(())
    }

    /// Register the table behind a typed model.
    ///
    /// The model's primary key must match the inferred one.
    pub fn register<M: Model>(&mut self) -> Result<()> {
        let descriptor = self.graph.require(M::TABLE_NAME)?;
        if descriptor.primary_key != M::PRIMARY_KEY {
            return Err(Error::Config(ConfigError {
                message: format!(
                    "Model for table \"{}\" declares primary key \"{}\" but the schema uses \"{}\"",
                    M::TABLE_NAME,
                    M::PRIMARY_KEY,
                    descriptor.primary_key
                ),
            }));
        }
        self.register_table(M::TABLE_NAME)
    }

    /// Install the post-init hook of a registered table.
    pub fn set_post_init<F>(&mut self, table_name: &str, hook: F) -> Result<()>
    where
        F: Fn(&mut Instance) + Send + Sync + 'static,
    {
        let name = self.model_name(table_name);
        let entry = self
            .models
            .get_mut(&name)
            .ok_or_else(|| model_not_found(table_name, &name))?;
        entry.post_init = Some(Arc::new(hook));
        Ok(())
    }

    /// Entry of the model hydrating `table_name`.
    pub fn lookup(&self, table_name: &str) -> Result<&ModelEntry> {
        let name = self.model_name(table_name);
        self.models
            .get(&name)
            .ok_or_else(|| model_not_found(table_name, &name))
    }

    pub fn descriptor(&self, table_name: &str) -> Result<&Arc<TableDescriptor>> {
        self.lookup(table_name).map(ModelEntry::descriptor)
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.models.contains_key(&self.model_name(table_name))
    }

    /// Model name of a table: the inferred camel name when the graph knows
    /// the table, `CamelCase(singular(table))` otherwise.
    fn model_name(&self, table_name: &str) -> String {
        self.graph.table(table_name).map_or_else(
            || to_camel_case(&to_singular(table_name, None)),
            |descriptor| descriptor.camel.clone(),
        )
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn model_not_found(table_name: &str, model: &str) -> Error {
    Error::Query(
        QueryError::new(
            QueryErrorKind::ModelNotFound,
            format!("No model \"{model}\" is registered for table \"{table_name}\""),
        )
        .with_table(table_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniquery_core::{Row, Value};
    use uniquery_schema::{InferenceConfig, StaticIntrospector, TableDef};

    fn graph() -> RelationGraph {
        let schema = StaticIntrospector::new(Dialect::Sqlite)
            .table(
                TableDef::new("cars")
                    .primary_key("car_id", "TEXT")
                    .column("name", "TEXT"),
            )
            .table(
                TableDef::new("repairs")
                    .primary_key("id", "INTEGER")
                    .column("car_id", "TEXT")
                    .foreign_key("car_id", "cars", "car_id"),
            );
        RelationGraph::infer(&schema, &InferenceConfig::default()).unwrap()
    }

    struct Car {
        name: String,
    }

    impl Model for Car {
        const TABLE_NAME: &'static str = "cars";
        const PRIMARY_KEY: &'static str = "car_id";

        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                name: row.get_named("name")?,
            })
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("name", self.name.clone().into())]
        }
    }

    struct BadCar;

    impl Model for BadCar {
        const TABLE_NAME: &'static str = "cars";
        const PRIMARY_KEY: &'static str = "id";

        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Self)
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            Vec::new()
        }
    }

    #[test]
    fn test_from_graph() {
        let registry = ModelRegistry::from_graph(graph());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.model_names().collect::<Vec<_>>(), vec!["Car", "Repair"]);
        assert_eq!(registry.descriptor("repairs").unwrap().table_name, "repairs");
        assert_eq!(registry.dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_explicit_registration() {
        let mut registry = ModelRegistry::new(graph());
        assert!(registry.is_empty());
        let err = registry.lookup("cars").unwrap_err();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::ModelNotFound));

        registry.register::<Car>().unwrap();
        assert!(registry.contains("cars"));
        assert!(!registry.contains("repairs"));

        let err = registry.register::<BadCar>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = registry.register_table("invoices").unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_post_init_requires_registration() {
        let mut registry = ModelRegistry::new(graph());
        assert!(registry.set_post_init("cars", |_| {}).is_err());
        registry.register_table("cars").unwrap();
        registry.set_post_init("cars", |_| {}).unwrap();
        assert!(registry.lookup("cars").unwrap().post_init().is_some());
        assert!(format!("{:?}", registry.lookup("cars").unwrap()).contains("post_init: true"));
    }
}
