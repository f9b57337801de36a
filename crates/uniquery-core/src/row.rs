//! Named field storage for hydrated instances.
//!
//! A [`Row`] holds the values of one table's selected columns. All rows of
//! one table in one query share a single [`ColumnInfo`], so a result with
//! thousands of instances keeps one copy of the column names per table.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered column names with a name index.
///
/// A name that occurs twice resolves to its first position.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnInfo {
    pub fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(position);
        }
        Self { names, positions }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, if selected.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Field values of one instance, addressed by position or column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<ColumnInfo>,
    values: Vec<Value>,
}

impl Row {
    /// Row with its own column list. Hydration uses [`Row::with_columns`]
    /// to share one list per table instead.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        Self::with_columns(Arc::new(ColumnInfo::new(column_names)), values)
    }

    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.values.get(self.columns.index_of(name)?)
    }

    /// Overwrite a field. Returns `false` when the column is not part of
    /// this row.
    pub fn set_by_name(&mut self, name: &str, value: Value) -> bool {
        let Some(slot) = self
            .columns
            .index_of(name)
            .and_then(|i| self.values.get_mut(i))
        else {
            return false;
        };
        *slot = value;
        true
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Convert the named field.
    ///
    /// Conversion errors carry the column name.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let Some(value) = self.get_by_name(name) else {
            return Err(Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("no column \"{name}\""),
                column: Some(name.to_string()),
            }));
        };
        T::from_value(value).map_err(|e| match e {
            Error::Type(te) => Error::Type(TypeError {
                column: Some(name.to_string()),
                ..te
            }),
            other => other,
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_names().zip(&self.values)
    }
}

/// Conversion out of a [`Value`], used for typed field access and by
/// `Model::from_row` implementations.
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, actual: impl Into<String>) -> Error {
    Error::Type(TypeError {
        expected,
        actual: actual.into(),
        column: None,
    })
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| mismatch("bool", value.type_name()))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = value
            .as_i64()
            .ok_or_else(|| mismatch("i32", value.type_name()))?;
        i32::try_from(wide).map_err(|_| mismatch("i32", format!("{wide} (out of range)")))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch("i64", value.type_name()))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| mismatch("f64", value.type_name()))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            other => Err(mismatch("String", other.type_name())),
        }
    }
}

/// NULL becomes `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

/// JSON columns, or text holding JSON.
impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => {
                serde_json::from_str(s).map_err(|e| mismatch("JSON", format!("invalid JSON: {e}")))
            }
            other => Err(mismatch("JSON", other.type_name())),
        }
    }
}
