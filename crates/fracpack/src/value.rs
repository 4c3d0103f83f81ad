//! Dynamic value model.

use indexmap::IndexMap;

/// A decoded fracpack value, or a value about to be packed.
///
/// The mapping onto type kinds:
///
/// | Value | Types |
/// |---|---|
/// | `Null` | absent `Option` |
/// | `Bool` | `bool` custom over `Int{1, unsigned}` |
/// | `Integer` / `UInteger` | signed / unsigned `Int` |
/// | `Float` | `Float` |
/// | `Str` | `string` custom |
/// | `Bytes` | `hex` custom |
/// | `Array` | `Array`, `List`, `Tuple` |
/// | `Object` | `Struct`, `Object` |
/// | `Variant` | `Variant` |
/// | `Map` | `map` custom |
///
/// A present `Option` is represented by its inner value directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Variant(String, Box<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Builds an `Object` from `(name, value)` pairs, keeping their order.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a `Variant` value.
    pub fn variant(name: impl Into<String>, value: Value) -> Self {
        Value::Variant(name.into(), Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::UInteger(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Variant(..) => "variant",
            Value::Map(_) => "map",
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts to JSON.
    ///
    /// Bytes become upper-case hex, variants `{name: value}`, maps arrays of
    /// `[key, value]` pairs. Non-finite floats become strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::UInteger(u) => Json::from(*u),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Json::Number(n),
                None => Json::String(f.to_string()),
            },
            Value::Str(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::String(hex::encode_upper(b)),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Variant(name, inner) => {
                let mut obj = serde_json::Map::with_capacity(1);
                obj.insert(name.clone(), inner.to_json());
                Json::Object(obj)
            }
            Value::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Integer(v as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInteger(v as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_json_matrix() {
        let value = Value::object([
            ("n", Value::Null),
            ("i", Value::from(-3i32)),
            ("u", Value::from(7u64)),
            ("f", Value::Float(1.5)),
            ("inf", Value::Float(f64::INFINITY)),
            ("s", Value::from("hi")),
            ("b", Value::Bytes(vec![0xab, 0x01])),
            ("v", Value::variant("A", Value::from(true))),
            ("m", Value::Map(vec![(Value::from("k"), Value::from(1u8))])),
        ]);
        assert_eq!(
            value.to_json(),
            json!({
                "n": null,
                "i": -3,
                "u": 7,
                "f": 1.5,
                "inf": "inf",
                "s": "hi",
                "b": "AB01",
                "v": {"A": true},
                "m": [["k", 1]],
            })
        );
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<u32>), Value::Null);
        assert_eq!(Value::from(Some(4u32)), Value::UInteger(4));
    }
}
