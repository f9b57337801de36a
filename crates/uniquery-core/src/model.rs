//! Model trait for typed records.
//!
//! Hydrated query results hold dynamically shaped instances. A type that
//! implements `Model` can be produced from any of them, which is how
//! generated, strongly-typed record structs plug into a query result.

use crate::Result;
use crate::row::Row;
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// # Example
///
/// ```ignore
/// use uniquery::{Model, Result, Row, Value};
///
/// struct Car {
///     car_id: String,
///     name: String,
///     year: i64,
/// }
///
/// impl Model for Car {
///     const TABLE_NAME: &'static str = "cars";
///     const PRIMARY_KEY: &'static str = "car_id";
///
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(Self {
///             car_id: row.get_named("car_id")?,
///             name: row.get_named("name")?,
///             year: row.get_named("year")?,
///         })
///     }
///
///     fn to_row(&self) -> Vec<(&'static str, Value)> {
///         vec![
///             ("car_id", self.car_id.clone().into()),
///             ("name", self.name.clone().into()),
///             ("year", self.year.into()),
///         ]
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key column name.
    const PRIMARY_KEY: &'static str;

    /// Construct a model instance from a database row.
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self>;

    /// Convert this model instance to a row of values.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Get the value of the primary key field.
    fn primary_key_value(&self) -> Value {
        self.to_row()
            .into_iter()
            .find(|(name, _)| *name == Self::PRIMARY_KEY)
            .map_or(Value::Null, |(_, v)| v)
    }

    /// Check if this is a new record (primary key is NULL).
    fn is_new(&self) -> bool {
        self.primary_key_value().is_null()
    }
}
