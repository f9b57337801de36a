//! Dynamic SQL values and primary-key identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A column value as returned by a driver or bound as a statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Exact numeric kept in its textual form
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    /// Days since the Unix epoch
    Date(i32),
    /// Microseconds since midnight
    Time(i64),
    /// Microseconds since the Unix epoch
    Timestamp(i64),
    /// Microseconds since the Unix epoch, UTC
    TimestampTz(i64),
    Uuid([u8; 16]),
    Json(serde_json::Value),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL-ish name of the variant, used in conversion errors.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "REAL",
            Value::Double(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::TimestampTz(_) => "TIMESTAMPTZ",
            Value::Uuid(_) => "UUID",
            Value::Json(_) => "JSON",
        }
    }

    /// Whether the value is left out of an instance summary: NULL, empty
    /// text or bytes, zero, or false.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) | Value::Decimal(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Float(_) | Value::Double(_) => self.as_f64() == Some(0.0),
            other => other.as_i64() == Some(0),
        }
    }

    /// Integers and booleans, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Bool(v) => Some(i64::from(v)),
            Value::TinyInt(v) => Some(i64::from(v)),
            Value::SmallInt(v) => Some(i64::from(v)),
            Value::Int(v) => Some(i64::from(v)),
            Value::BigInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            other => other.as_i64().map(|v| v != 0),
        }
    }

    /// Any numeric value as a float. Decimals are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::Decimal(s) => s.parse().ok(),
            Value::Bool(_) => None,
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            // `{:?}` keeps the fraction of whole floats: 500.0, not 500
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Decimal(s) | Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) | Value::Timestamp(v) | Value::TimestampTz(v) => write!(f, "{v}"),
            Value::Uuid(u) => {
                for (i, byte) in u.iter().enumerate() {
                    if matches!(i, 4 | 6 | 8 | 10) {
                        f.write_str("-")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Json(j) => write!(f, "{j}"),
            integer => write!(f, "{}", integer.as_i64().unwrap_or_default()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    [u8; 16] => Uuid,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Hashable identity of a primary-key (or foreign-key) value.
///
/// Integer widths are normalized so `Int(1)` and `BigInt(1)` are the same
/// key, and floats compare by bit pattern so `Eq` and `Hash` agree.
#[derive(Debug, Clone)]
pub struct Key(Value);

impl Key {
    /// Build a key from a non-NULL value. Returns `None` for NULL.
    pub fn new(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self(value.clone())),
            integer @ (Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_)) => {
                integer.as_i64().map(|v| Self(Value::BigInt(v)))
            }
            other => Some(Self(other.clone())),
        }
    }

    /// The normalized value behind this key.
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Json(a), Value::Json(b)) => a.to_string() == b.to_string(),
            (a, b) => a == b,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::TinyInt(v) => v.hash(state),
            Value::SmallInt(v) => v.hash(state),
            Value::Int(v) | Value::Date(v) => v.hash(state),
            Value::BigInt(v) | Value::Time(v) | Value::Timestamp(v) | Value::TimestampTz(v) => {
                v.hash(state);
            }
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Decimal(s) | Value::Text(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Json(j) => j.to_string().hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_is_null_and_type_name() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
        assert_eq!(Value::Text("a".into()).type_name(), "TEXT");
        assert_eq!(Value::BigInt(1).type_name(), "BIGINT");
    }

    #[test]
    fn test_option_conversion() {
        let some: Value = Some(3_i64).into();
        let none: Value = Option::<i64>::None.into();
        assert_eq!(some, Value::BigInt(3));
        assert_eq!(none, Value::Null);
        assert_eq!(Value::from(Some("Car1")), Value::Text("Car1".into()));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::SmallInt(-4).as_i64(), Some(-4));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Text("1".into()).as_i64(), None);
        assert_eq!(Value::Decimal("2.5".into()).as_f64(), Some(2.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::TinyInt(0).as_bool(), Some(false));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Text("Volvo".into()).to_string(), "Volvo");
        assert_eq!(Value::BigInt(42).to_string(), "42");
        assert_eq!(Value::SmallInt(-7).to_string(), "-7");
        assert_eq!(Value::Double(500.0).to_string(), "500.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Double(0.1).to_string(), "0.1");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(
            Value::Uuid([0x12; 16]).to_string(),
            "12121212-1212-1212-1212-121212121212"
        );
    }

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::Text(String::new()).is_blank());
        assert!(Value::Int(0).is_blank());
        assert!(Value::Double(0.0).is_blank());
        assert!(Value::Bool(false).is_blank());
        assert!(!Value::Int(3).is_blank());
        assert!(!Value::Text("x".into()).is_blank());
    }

    #[test]
    fn test_key_rejects_null() {
        assert!(Key::new(&Value::Null).is_none());
    }

    #[test]
    fn test_key_normalizes_integer_width() {
        let mut map = HashMap::new();
        map.insert(Key::new(&Value::Int(7)).unwrap(), "seven");
        assert_eq!(map.get(&Key::new(&Value::BigInt(7)).unwrap()), Some(&"seven"));
        assert_eq!(map.get(&Key::new(&Value::SmallInt(7)).unwrap()), Some(&"seven"));
        assert!(!map.contains_key(&Key::new(&Value::Text("7".into())).unwrap()));
        assert_eq!(Key::new(&Value::TinyInt(7)).unwrap().value(), &Value::BigInt(7));
    }

    #[test]
    fn test_key_float_bits() {
        let a = Key::new(&Value::Double(1.5)).unwrap();
        let b = Key::new(&Value::Double(1.5)).unwrap();
        assert_eq!(a, b);
        let nan1 = Key::new(&Value::Double(f64::NAN)).unwrap();
        let nan2 = Key::new(&Value::Double(f64::NAN)).unwrap();
        assert_eq!(nan1, nan2);
    }
}
