//! Serializable schema description.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::to_type_def::ToTypeDef;

/// An ordered mapping from type name to description.
///
/// ```
/// use fracpack::SchemaDef;
///
/// let def: SchemaDef = serde_json::from_str(
///     r#"{
///         "u32": {"Int": {"bits": 32, "isSigned": false}},
///         "Point": {"Object": {"x": "u32", "y": {"Type": "u32"}}}
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(def.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDef(pub IndexMap<String, TypeDef>);

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a named type.
    pub fn insert(&mut self, name: impl Into<String>, def: TypeDef) -> &mut Self {
        self.0.insert(name.into(), def);
        self
    }

    /// Adds a named type describing the Rust type `T`.
    pub fn insert_type<T: ToTypeDef + ?Sized>(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(name, T::type_def())
    }

    pub fn with(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.insert(name, def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.0.iter()
    }
}

/// Description of one type.
///
/// Serializes as a single-key map keyed by kind, or as a bare string for a
/// reference to another named type. `{"Type": name}` is accepted as a
/// reference too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTypeDef")]
pub enum TypeDef {
    Struct(IndexMap<String, TypeDef>),
    Object(IndexMap<String, TypeDef>),
    Array {
        #[serde(rename = "type")]
        type_: Box<TypeDef>,
        len: u64,
    },
    List(Box<TypeDef>),
    Option(Box<TypeDef>),
    Variant(IndexMap<String, TypeDef>),
    Tuple(Vec<TypeDef>),
    Int {
        bits: u32,
        #[serde(rename = "isSigned")]
        is_signed: bool,
    },
    Float {
        exp: u32,
        mantissa: u32,
    },
    FracPack(Box<TypeDef>),
    Custom {
        #[serde(rename = "type")]
        type_: Box<TypeDef>,
        id: String,
    },
    #[serde(untagged)]
    Type(String),
}

#[derive(Deserialize)]
enum RawTypeDef {
    Struct(IndexMap<String, TypeDef>),
    Object(IndexMap<String, TypeDef>),
    Array {
        #[serde(rename = "type")]
        type_: Box<TypeDef>,
        #[serde(deserialize_with = "deserialize_number_from_string")]
        len: u64,
    },
    List(Box<TypeDef>),
    Option(Box<TypeDef>),
    Variant(IndexMap<String, TypeDef>),
    Tuple(Vec<TypeDef>),
    Int {
        bits: u32,
        #[serde(rename = "isSigned")]
        is_signed: bool,
    },
    Float {
        exp: u32,
        mantissa: u32,
    },
    FracPack(Box<TypeDef>),
    Custom {
        #[serde(rename = "type")]
        type_: Box<TypeDef>,
        id: String,
    },
    Type(String),
    #[serde(untagged)]
    Ref(String),
}

impl From<RawTypeDef> for TypeDef {
    fn from(raw: RawTypeDef) -> Self {
        match raw {
            RawTypeDef::Struct(m) => TypeDef::Struct(m),
            RawTypeDef::Object(m) => TypeDef::Object(m),
            RawTypeDef::Array { type_, len } => TypeDef::Array { type_, len },
            RawTypeDef::List(t) => TypeDef::List(t),
            RawTypeDef::Option(t) => TypeDef::Option(t),
            RawTypeDef::Variant(m) => TypeDef::Variant(m),
            RawTypeDef::Tuple(v) => TypeDef::Tuple(v),
            RawTypeDef::Int { bits, is_signed } => TypeDef::Int { bits, is_signed },
            RawTypeDef::Float { exp, mantissa } => TypeDef::Float { exp, mantissa },
            RawTypeDef::FracPack(t) => TypeDef::FracPack(t),
            RawTypeDef::Custom { type_, id } => TypeDef::Custom { type_, id },
            RawTypeDef::Type(name) | RawTypeDef::Ref(name) => TypeDef::Type(name),
        }
    }
}

impl TypeDef {
    /// Description of the Rust type `T`.
    pub fn of<T: ToTypeDef + ?Sized>() -> TypeDef {
        T::type_def()
    }

    pub fn int(bits: u32, is_signed: bool) -> TypeDef {
        TypeDef::Int { bits, is_signed }
    }

    pub fn u8() -> TypeDef {
        Self::int(8, false)
    }

    pub fn u16() -> TypeDef {
        Self::int(16, false)
    }

    pub fn u32() -> TypeDef {
        Self::int(32, false)
    }

    pub fn u64() -> TypeDef {
        Self::int(64, false)
    }

    pub fn i8() -> TypeDef {
        Self::int(8, true)
    }

    pub fn i16() -> TypeDef {
        Self::int(16, true)
    }

    pub fn i32() -> TypeDef {
        Self::int(32, true)
    }

    pub fn i64() -> TypeDef {
        Self::int(64, true)
    }

    pub fn f32() -> TypeDef {
        TypeDef::Float {
            exp: 8,
            mantissa: 24,
        }
    }

    pub fn f64() -> TypeDef {
        TypeDef::Float {
            exp: 11,
            mantissa: 53,
        }
    }

    /// `bool` hook over a 1-bit unsigned int.
    pub fn bool() -> TypeDef {
        Self::custom(Self::int(1, false), "bool")
    }

    /// `string` hook over a list of bytes.
    pub fn string() -> TypeDef {
        Self::custom(Self::list(Self::u8()), "string")
    }

    /// `hex` hook over `inner`.
    pub fn hex(inner: TypeDef) -> TypeDef {
        Self::custom(inner, "hex")
    }

    pub fn list(elem: TypeDef) -> TypeDef {
        TypeDef::List(Box::new(elem))
    }

    pub fn option(inner: TypeDef) -> TypeDef {
        TypeDef::Option(Box::new(inner))
    }

    pub fn array(elem: TypeDef, len: u64) -> TypeDef {
        TypeDef::Array {
            type_: Box::new(elem),
            len,
        }
    }

    pub fn fracpack(inner: TypeDef) -> TypeDef {
        TypeDef::FracPack(Box::new(inner))
    }

    pub fn custom(repr: TypeDef, id: impl Into<String>) -> TypeDef {
        TypeDef::Custom {
            type_: Box::new(repr),
            id: id.into(),
        }
    }

    /// Reference to a named type.
    pub fn named(name: impl Into<String>) -> TypeDef {
        TypeDef::Type(name.into())
    }

    pub fn tuple(members: impl IntoIterator<Item = TypeDef>) -> TypeDef {
        TypeDef::Tuple(members.into_iter().collect())
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeDef)>) -> TypeDef {
        TypeDef::Object(collect_members(fields))
    }

    pub fn struct_<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeDef)>) -> TypeDef {
        TypeDef::Struct(collect_members(fields))
    }

    pub fn variant<K: Into<String>>(
        alternatives: impl IntoIterator<Item = (K, TypeDef)>,
    ) -> TypeDef {
        TypeDef::Variant(collect_members(alternatives))
    }
}

fn collect_members<K: Into<String>>(
    members: impl IntoIterator<Item = (K, TypeDef)>,
) -> IndexMap<String, TypeDef> {
    members.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
