//! Core types and traits for UniQuery.
//!
//! This crate provides the foundational abstractions shared by relation
//! inference and query hydration:
//!
//! - `Value` and `Key` for column values and identity-map keys
//! - `Row` and `FromValue` for positional and typed column access
//! - `Model` trait for typed records built from hydrated instances
//! - `Dialect` for placeholder and identifier conventions
//! - `inflect` for singular/plural/CamelCase table naming
//! - `Error` taxonomy shared by every crate in the workspace

pub mod dialect;
pub mod error;
pub mod inflect;
pub mod model;
pub mod row;
pub mod value;

pub use dialect::Dialect;
pub use error::{
    ConfigError, Error, QueryError, QueryErrorKind, Result, SchemaError, SchemaErrorKind,
    TypeError, WriteError, WriteErrorKind,
};
pub use model::Model;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::{Key, Value};
