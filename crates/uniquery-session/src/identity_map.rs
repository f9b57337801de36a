//! Identity Map pattern: one instance per primary key, per table, per query.
//!
//! Each table of a query result owns an [`IdentityMap`]. Row intake inserts
//! an instance the first time a primary key is seen and skips every later
//! row carrying the same key, so a parent repeated by a join is
//! materialized once.
//!
//! Instances live in a vector in first-appearance order; the key index maps
//! each primary key to its position. Relation attributes refer to instances
//! by that position (see [`InstanceRef`](crate::InstanceRef)), never by
//! pointer.
//!
//! # Example
//!
//! ```ignore
//! let cars = result.dict("cars").unwrap();
//! let volvo = cars.get(&Value::from("Car2")).unwrap();
//! assert_eq!(volvo.get::<String>("make")?, "Volvo");
//! ```

use std::collections::HashMap;
use uniquery_core::{Key, Value};

use crate::instance::Instance;

/// Per-table map from primary key to the single instance for that key.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    index: HashMap<Key, usize>,
    instances: Vec<Instance>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instance unless its key is already present.
    ///
    /// Returns the position of the instance stored under `key` and whether
    /// it was inserted by this call.
    pub(crate) fn insert(&mut self, key: Key, instance: Instance) -> (usize, bool) {
        if let Some(&position) = self.index.get(&key) {
            return (position, false);
        }
        let position = self.instances.len();
        self.index.insert(key, position);
        self.instances.push(instance);
        (position, true)
    }

    /// Look up an instance by primary-key value.
    pub fn get(&self, primary_key: &Value) -> Option<&Instance> {
        self.position(primary_key).map(|i| &self.instances[i])
    }

    /// Position of the instance stored under `primary_key`.
    pub fn position(&self, primary_key: &Value) -> Option<usize> {
        let key = Key::new(primary_key)?;
        self.position_of_key(&key)
    }

    pub fn position_of_key(&self, key: &Key) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, primary_key: &Value) -> bool {
        self.position(primary_key).is_some()
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Instance at `position`.
    pub fn at(&self, position: usize) -> Option<&Instance> {
        self.instances.get(position)
    }

    pub(crate) fn at_mut(&mut self, position: usize) -> Option<&mut Instance> {
        self.instances.get_mut(position)
    }

    /// Instances in first-appearance order.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    /// Primary keys in first-appearance order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.instances.iter().filter_map(Instance::key)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl<'a> IntoIterator for &'a IdentityMap {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uniquery_core::{Dialect, Row};
    use uniquery_schema::{InferenceConfig, RelationGraph, StaticIntrospector, TableDef};

    fn instance(id: Value, name: &str) -> Instance {
        let schema = StaticIntrospector::new(Dialect::Sqlite).table(
            TableDef::new("salesreps")
                .primary_key("id", "INTEGER")
                .column("name", "TEXT"),
        );
        let graph = RelationGraph::infer(&schema, &InferenceConfig::default()).unwrap();
        let descriptor = Arc::new(graph.table("salesreps").unwrap().clone());
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![id, name.into()],
        );
        Instance::new(descriptor, row)
    }

    fn insert(map: &mut IdentityMap, id: Value, name: &str) -> (usize, bool) {
        let key = Key::new(&id).unwrap();
        map.insert(key, instance(id, name))
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = IdentityMap::new();
        assert!(map.is_empty());
        assert_eq!(insert(&mut map, Value::Int(1), "Alice"), (0, true));
        assert_eq!(insert(&mut map, Value::Int(2), "Bob"), (1, true));

        assert_eq!(map.len(), 2);
        let alice = map.get(&Value::Int(1)).unwrap();
        assert_eq!(alice.get::<String>("name").unwrap(), "Alice");
        assert!(map.contains(&Value::Int(2)));
        assert!(!map.contains(&Value::Int(3)));
        assert!(!map.contains(&Value::Null));
    }

    #[test]
    fn test_duplicate_key_keeps_first() {
        let mut map = IdentityMap::new();
        insert(&mut map, Value::Int(1), "Alice");
        assert_eq!(insert(&mut map, Value::Int(1), "Other"), (0, false));
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(&Value::Int(1)).unwrap().get::<String>("name").unwrap(),
            "Alice"
        );
    }

    #[test]
    fn test_integer_widths_share_keys() {
        let mut map = IdentityMap::new();
        insert(&mut map, Value::BigInt(7), "Alice");
        assert!(map.contains(&Value::Int(7)));
        assert!(map.contains(&Value::SmallInt(7)));
        assert!(!map.contains(&Value::Text("7".to_string())));
    }

    #[test]
    fn test_first_appearance_order() {
        let mut map = IdentityMap::new();
        insert(&mut map, Value::Int(3), "C");
        insert(&mut map, Value::Int(1), "A");
        insert(&mut map, Value::Int(2), "B");
        let names: Vec<String> = map
            .iter()
            .map(|i| i.get::<String>("name").unwrap())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["3", "1", "2"]);
        assert_eq!(map.position(&Value::Int(2)), Some(2));
        assert!(map.at(5).is_none());
    }
}
