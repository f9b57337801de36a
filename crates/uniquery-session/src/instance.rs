//! Model instances produced by hydration.

use std::fmt;
use std::sync::Arc;
use uniquery_core::{Error, FromValue, Key, QueryError, QueryErrorKind, Result, Row, Value};
use uniquery_schema::TableDescriptor;

/// Maximum number of values shown by an instance's `Display`.
const MAX_DISPLAY_VALUES: usize = 6;
/// Longer values are cut and end with `...`.
const MAX_DISPLAY_LEN: usize = 20;

static NULL: Value = Value::Null;

/// Position of an instance inside a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceRef {
    /// Index of the table among the result's tables.
    pub table: usize,
    /// Index of the instance in its table's identity map.
    pub index: usize,
}

/// Value of a relation attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// Many-to-one: the referenced instance, `None` when the foreign key is
    /// NULL or points outside the result.
    One(Option<InstanceRef>),
    /// One-to-many or many-to-many.
    Many(Vec<InstanceRef>),
}

/// One row of one table, with its relation attributes.
///
/// Relation slots follow [`TableDescriptor::relations`]. A slot is `None`
/// when the attribute is absent, for example a many-to-many relation whose
/// link table was not queried.
#[derive(Debug, Clone)]
pub struct Instance {
    descriptor: Arc<TableDescriptor>,
    row: Row,
    links: Vec<Option<Link>>,
}

impl Instance {
    pub(crate) fn new(descriptor: Arc<TableDescriptor>, row: Row) -> Self {
        let links = vec![None; descriptor.relation_count()];
        Self {
            descriptor,
            row,
            links,
        }
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn table_name(&self) -> &str {
        &self.descriptor.table_name
    }

    /// CamelCase model name.
    pub fn model_name(&self) -> &str {
        &self.descriptor.camel
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Primary-key value, NULL for a record not saved yet.
    pub fn primary_key_value(&self) -> &Value {
        self.row
            .get_by_name(&self.descriptor.primary_key)
            .unwrap_or(&NULL)
    }

    /// Identity-map key, `None` while the primary key is NULL.
    pub fn key(&self) -> Option<Key> {
        Key::new(self.primary_key_value())
    }

    /// Whether the primary key is NULL.
    pub fn is_new(&self) -> bool {
        self.primary_key_value().is_null()
    }

    /// Raw value of a selected column.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.row.get_by_name(column)
    }

    /// Typed value of a selected column.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        if !self.row.contains_column(column) {
            return Err(self.column_not_found(column));
        }
        self.row.get_named(column)
    }

    /// Overwrite a selected column.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        if self.row.set_by_name(column, value.into()) {
            Ok(())
        } else {
            Err(self.column_not_found(column))
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.row.contains_column(column)
    }

    /// Relation attribute, `None` if unknown or absent.
    pub fn link(&self, attribute: &str) -> Option<&Link> {
        let slot = self.descriptor.attribute_slot(attribute)?;
        self.links.get(slot)?.as_ref()
    }

    /// Whether the relation attribute is present.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.link(attribute).is_some()
    }

    /// Names of the present relation attributes, in slot order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.descriptor
            .relations()
            .zip(&self.links)
            .filter(|(_, link)| link.is_some())
            .map(|(relation, _)| relation.attribute_name())
    }

    pub(crate) fn set_row(&mut self, row: Row) {
        self.row = row;
    }

    pub(crate) fn slot(&self, slot: usize) -> Option<&Link> {
        self.links.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn set_slot(&mut self, slot: usize, link: Link) {
        if let Some(entry) = self.links.get_mut(slot) {
            *entry = Some(link);
        }
    }

    /// Append to a list slot, creating it if absent.
    pub(crate) fn push_to_slot(&mut self, slot: usize, target: InstanceRef) {
        let Some(entry) = self.links.get_mut(slot) else {
            return;
        };
        match entry {
            Some(Link::Many(list)) => list.push(target),
            _ => *entry = Some(Link::Many(vec![target])),
        }
    }

    fn column_not_found(&self, column: &str) -> Error {
        Error::Query(
            QueryError::new(
                QueryErrorKind::ColumnNotFound,
                format!(
                    "Column \"{column}\" is not available on \"{}\"",
                    self.descriptor.table_name
                ),
            )
            .with_table(&self.descriptor.table_name)
            .with_column(column),
        )
    }
}

impl fmt::Display for Instance {
    /// `<Car: name=Volvo, car_id=Car2, year=2020>`: non-blank scalar values
    /// in field-priority order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = Vec::new();
        for column in &self.descriptor.field_priority {
            let Some(value) = self.row.get_by_name(column) else {
                continue;
            };
            if value.is_blank() {
                continue;
            }
            if values.len() == MAX_DISPLAY_VALUES {
                values.push("[...]".to_string());
                break;
            }
            let mut text = value.to_string();
            if text.chars().count() > MAX_DISPLAY_LEN {
                text = text.chars().take(MAX_DISPLAY_LEN - 2).collect::<String>() + "...";
            }
            values.push(format!("{column}={text}"));
        }
        write!(f, "<{}: {}>", self.descriptor.camel, values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniquery_core::Dialect;
    use uniquery_schema::{InferenceConfig, RelationGraph, StaticIntrospector, TableDef};

    fn descriptor() -> Arc<TableDescriptor> {
        let schema = StaticIntrospector::new(Dialect::Sqlite).table(
            TableDef::new("clients")
                .primary_key("client_id", "TEXT")
                .column("first_name", "TEXT")
                .column("last_name", "TEXT")
                .column("notes", "TEXT")
                .column("city", "TEXT")
                .column("street", "TEXT")
                .column("visits", "INTEGER")
                .column("vip", "BOOLEAN"),
        );
        let graph = RelationGraph::infer(&schema, &InferenceConfig::default()).unwrap();
        Arc::new(graph.table("clients").unwrap().clone())
    }

    fn client(values: Vec<Value>) -> Instance {
        let descriptor = descriptor();
        let names = descriptor.column_names().map(str::to_string).collect();
        Instance::new(descriptor, Row::new(names, values))
    }

    #[test]
    fn test_display() {
        let instance = client(vec![
            "Client1".into(),
            "Ann".into(),
            "".into(),
            "a very long note about this client".into(),
            "Oslo".into(),
            Value::Null,
            0_i64.into(),
            false.into(),
        ]);
        assert_eq!(
            instance.to_string(),
            "<Client: first_name=Ann, client_id=Client1, notes=a very long note a..., city=Oslo>"
        );
    }

    #[test]
    fn test_display_truncates_list() {
        let instance = client(vec![
            "C1".into(),
            "Ann".into(),
            "Lee".into(),
            "note".into(),
            "Oslo".into(),
            "Main".into(),
            3_i64.into(),
            true.into(),
        ]);
        assert_eq!(
            instance.to_string(),
            "<Client: first_name=Ann, last_name=Lee, client_id=C1, notes=note, city=Oslo, street=Main, [...]>"
        );
    }

    #[test]
    fn test_typed_access() {
        let mut instance = client(vec![
            "C1".into(),
            "Ann".into(),
            "Lee".into(),
            Value::Null,
            "Oslo".into(),
            Value::Null,
            3_i64.into(),
            true.into(),
        ]);
        assert_eq!(instance.get::<i64>("visits").unwrap(), 3);
        assert_eq!(instance.get::<Option<String>>("notes").unwrap(), None);
        assert_eq!(instance.primary_key_value(), &Value::from("C1"));
        assert!(!instance.is_new());

        instance.set("city", "Bergen").unwrap();
        assert_eq!(instance.get::<String>("city").unwrap(), "Bergen");

        let err = instance.get::<String>("email").unwrap_err();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::ColumnNotFound));
        let err = instance.set("email", "x").unwrap_err();
        assert_eq!(err.query_kind(), Some(QueryErrorKind::ColumnNotFound));
        assert!(instance.get::<i64>("city").is_err());
    }

    #[test]
    fn test_slots() {
        let instance = client(vec![Value::Null; 8]);
        assert!(instance.is_new());
        assert!(instance.key().is_none());
        assert_eq!(instance.attributes().count(), 0);
        assert!(instance.link("cars").is_none());
    }
}
