//! The hooks every schema can rely on: `bool`, `string`, `hex` and `map`.

use fracpack_buffers::{InputStream, OutputStream};
use serde_json::Value as Json;

use super::{CustomHandler, CustomTypes};
use crate::codec::{json_mismatch, mismatch, Codec};
use crate::error::{FracpackError, Result};
use crate::schema::Schema;
use crate::types::{TypeDescriptor, TypeId};
use crate::value::Value;

/// Registry holding the four standard hooks under their usual ids.
pub fn standard_types() -> CustomTypes {
    CustomTypes::new()
        .with("bool", BoolHandler)
        .with("string", StringHandler)
        .with("hex", HexHandler)
        .with("map", MapHandler)
}

fn write_len_prefixed(bytes: &[u8], out: &mut OutputStream) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| FracpackError::BadSize)?;
    out.write_u32(len);
    out.write_bytes(bytes);
    Ok(())
}

/// `Value::Bool` over a 1-bit unsigned int.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolHandler;

impl CustomHandler for BoolHandler {
    fn matches(&self, schema: &Schema, repr: TypeId) -> bool {
        matches!(
            schema.descriptor(repr),
            TypeDescriptor::Int {
                bits: 1,
                is_signed: false
            }
        )
    }

    fn pack(&self, _codec: &Codec<'_>, _repr: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        match value {
            Value::Bool(b) => {
                out.write_u8(u8::from(*b));
                Ok(())
            }
            other => Err(mismatch("bool", other)),
        }
    }

    fn unpack(&self, _codec: &Codec<'_>, _repr: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        match input.read_u8()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            _ => Err(FracpackError::IntegerOutOfRange {
                bits: 1,
                signed: false,
            }),
        }
    }

    fn from_json(&self, _codec: &Codec<'_>, _repr: TypeId, json: &Json) -> Result<Value> {
        match json {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(json_mismatch("bool", other)),
        }
    }
}

/// UTF-8 `Value::Str` over a list of 8-bit ints.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringHandler;

impl CustomHandler for StringHandler {
    fn matches(&self, schema: &Schema, repr: TypeId) -> bool {
        let TypeDescriptor::List(elem) = schema.descriptor(repr) else {
            return false;
        };
        matches!(
            schema.descriptor(schema.structural(*elem)),
            TypeDescriptor::Int { bits: 8, .. }
        )
    }

    fn pack(&self, _codec: &Codec<'_>, _repr: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        match value {
            Value::Str(s) => write_len_prefixed(s.as_bytes(), out),
            other => Err(mismatch("string", other)),
        }
    }

    fn unpack(&self, _codec: &Codec<'_>, _repr: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let len = input.read_u32()?;
        let bytes = input.read_bytes(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| FracpackError::BadUtf8)?;
        Ok(Value::Str(s.to_owned()))
    }

    fn is_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId, value: &Value) -> bool {
        matches!(value, Value::Str(s) if s.is_empty())
    }

    fn new_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId) -> Result<Value> {
        Ok(Value::Str(String::new()))
    }

    fn from_json(&self, _codec: &Codec<'_>, _repr: TypeId, json: &Json) -> Result<Value> {
        match json {
            Json::String(s) => Ok(Value::Str(s.clone())),
            other => Err(json_mismatch("string", other)),
        }
    }
}

/// Raw `Value::Bytes`, rendered as hex in JSON.
///
/// Accepts a list of fixed-size elements, a nested fracpack payload, or any
/// fixed-size type. For lists the byte count must be a whole number of
/// elements; for fixed-size types it must equal the type's size.
#[derive(Debug, Default, Clone, Copy)]
pub struct HexHandler;

enum HexShape {
    List { elem_size: u32 },
    Sized,
    Fixed(u32),
}

fn hex_shape(schema: &Schema, repr: TypeId) -> Option<HexShape> {
    match schema.descriptor(repr) {
        TypeDescriptor::List(elem) => {
            let layout = schema.layout(*elem);
            (!layout.is_variable_size && layout.fixed_size > 0).then_some(HexShape::List {
                elem_size: layout.fixed_size,
            })
        }
        TypeDescriptor::FracPack(_) => Some(HexShape::Sized),
        _ => {
            let layout = schema.layout(repr);
            (!layout.is_variable_size).then_some(HexShape::Fixed(layout.fixed_size))
        }
    }
}

impl CustomHandler for HexHandler {
    fn matches(&self, schema: &Schema, repr: TypeId) -> bool {
        hex_shape(schema, repr).is_some()
    }

    fn pack(&self, codec: &Codec<'_>, repr: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        let Value::Bytes(bytes) = value else {
            return Err(mismatch("bytes", value));
        };
        match hex_shape(codec.schema(), repr) {
            Some(HexShape::List { elem_size }) => {
                if bytes.len() % elem_size as usize != 0 {
                    return Err(FracpackError::BadSize);
                }
                write_len_prefixed(bytes, out)
            }
            Some(HexShape::Sized) => write_len_prefixed(bytes, out),
            Some(HexShape::Fixed(size)) => {
                if bytes.len() != size as usize {
                    return Err(FracpackError::BadSize);
                }
                out.write_bytes(bytes);
                Ok(())
            }
            None => codec.pack_value(value, repr, out),
        }
    }

    fn unpack(&self, codec: &Codec<'_>, repr: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let bytes = match hex_shape(codec.schema(), repr) {
            Some(HexShape::List { elem_size }) => {
                let len = input.read_u32()?;
                if len % elem_size != 0 {
                    return Err(FracpackError::BadSize);
                }
                input.read_bytes(len)?
            }
            Some(HexShape::Sized) => {
                let len = input.read_u32()?;
                input.read_bytes(len)?
            }
            Some(HexShape::Fixed(size)) => input.read_bytes(size)?,
            None => return codec.unpack_value(repr, input),
        };
        Ok(Value::Bytes(bytes.to_vec()))
    }

    fn is_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId, value: &Value) -> bool {
        matches!(value, Value::Bytes(b) if b.is_empty())
    }

    fn new_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId) -> Result<Value> {
        Ok(Value::Bytes(Vec::new()))
    }

    fn from_json(&self, _codec: &Codec<'_>, _repr: TypeId, json: &Json) -> Result<Value> {
        match json {
            Json::String(s) => hex::decode(s)
                .map(Value::Bytes)
                .map_err(|_| FracpackError::BadHex),
            other => Err(json_mismatch("hex string", other)),
        }
    }
}

/// `Value::Map` over a list of two-member entries.
///
/// The entry may be a Struct or Object (first member is the key, second the
/// value) or a two-element Tuple.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapHandler;

enum EntryShape<'s> {
    Named {
        key: &'s str,
        value: &'s str,
        key_ty: TypeId,
        value_ty: TypeId,
    },
    Positional {
        key_ty: TypeId,
        value_ty: TypeId,
    },
}

impl EntryShape<'_> {
    fn types(&self) -> (TypeId, TypeId) {
        match self {
            EntryShape::Named {
                key_ty, value_ty, ..
            }
            | EntryShape::Positional { key_ty, value_ty } => (*key_ty, *value_ty),
        }
    }

    fn entry(&self, key: Value, value: Value) -> Value {
        match self {
            EntryShape::Named {
                key: k, value: v, ..
            } => Value::object([(*k, key), (*v, value)]),
            EntryShape::Positional { .. } => Value::Array(vec![key, value]),
        }
    }

    fn split(&self, entry: Value) -> Result<(Value, Value)> {
        match (self, entry) {
            (EntryShape::Named { key, value, .. }, Value::Object(mut fields)) => {
                let k = fields.shift_remove(*key).unwrap_or(Value::Null);
                let v = fields.shift_remove(*value).unwrap_or(Value::Null);
                Ok((k, v))
            }
            (EntryShape::Positional { .. }, Value::Array(items)) => {
                let mut items = items.into_iter();
                let k = items.next().unwrap_or(Value::Null);
                let v = items.next().unwrap_or(Value::Null);
                Ok((k, v))
            }
            (_, other) => Err(mismatch("map entry", &other)),
        }
    }
}

fn entry_shape(schema: &Schema, repr: TypeId) -> Option<EntryShape<'_>> {
    let TypeDescriptor::List(elem) = schema.descriptor(repr) else {
        return None;
    };
    match schema.descriptor(schema.structural(*elem)) {
        TypeDescriptor::Struct { fields, .. } | TypeDescriptor::Object(fields)
            if fields.len() == 2 =>
        {
            Some(EntryShape::Named {
                key: &fields[0].name,
                value: &fields[1].name,
                key_ty: fields[0].ty,
                value_ty: fields[1].ty,
            })
        }
        TypeDescriptor::Tuple(types) if types.len() == 2 => Some(EntryShape::Positional {
            key_ty: types[0],
            value_ty: types[1],
        }),
        _ => None,
    }
}

impl CustomHandler for MapHandler {
    fn matches(&self, schema: &Schema, repr: TypeId) -> bool {
        entry_shape(schema, repr).is_some()
    }

    fn pack(&self, codec: &Codec<'_>, repr: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        let Value::Map(entries) = value else {
            return Err(mismatch("map", value));
        };
        let Some(shape) = entry_shape(codec.schema(), repr) else {
            return codec.pack_value(value, repr, out);
        };
        let items = entries
            .iter()
            .map(|(k, v)| shape.entry(k.clone(), v.clone()))
            .collect();
        codec.pack_value(&Value::Array(items), repr, out)
    }

    fn unpack(&self, codec: &Codec<'_>, repr: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let value = codec.unpack_value(repr, input)?;
        let Some(shape) = entry_shape(codec.schema(), repr) else {
            return Ok(value);
        };
        let Value::Array(items) = value else {
            return Err(mismatch("array", &value));
        };
        items
            .into_iter()
            .map(|entry| shape.split(entry))
            .collect::<Result<_>>()
            .map(Value::Map)
    }

    fn is_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId, value: &Value) -> bool {
        matches!(value, Value::Map(entries) if entries.is_empty())
    }

    fn new_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId) -> Result<Value> {
        Ok(Value::Map(Vec::new()))
    }

    /// Accepts `[[key, value], ..]`, a list of entry objects, or a JSON
    /// object whose keys are converted through the key type.
    fn from_json(&self, codec: &Codec<'_>, repr: TypeId, json: &Json) -> Result<Value> {
        let Some(shape) = entry_shape(codec.schema(), repr) else {
            return codec.value_from_json(json, repr);
        };
        let (key_ty, value_ty) = shape.types();
        let entries = match json {
            Json::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    Ok((
                        codec.value_from_json(&Json::String(k.clone()), key_ty)?,
                        codec.value_from_json(v, value_ty)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
            Json::Array(items) => items
                .iter()
                .map(|item| match (item, &shape) {
                    (Json::Array(pair), _) if pair.len() == 2 => Ok((
                        codec.value_from_json(&pair[0], key_ty)?,
                        codec.value_from_json(&pair[1], value_ty)?,
                    )),
                    (Json::Object(fields), EntryShape::Named { key, value, .. }) => Ok((
                        codec.value_from_json(fields.get(*key).unwrap_or(&Json::Null), key_ty)?,
                        codec.value_from_json(fields.get(*value).unwrap_or(&Json::Null), value_ty)?,
                    )),
                    (other, _) => Err(json_mismatch("map entry", other)),
                })
                .collect::<Result<Vec<_>>>()?,
            other => return Err(json_mismatch("map", other)),
        };
        Ok(Value::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaDef, TypeDef};

    fn schema(def: TypeDef) -> (Schema, TypeId) {
        let def = SchemaDef::new().with("t", def);
        let schema = Schema::load(&def, &standard_types()).unwrap();
        let ty = schema.type_id("t").unwrap();
        (schema, ty)
    }

    #[test]
    fn bool_rejects_bytes_other_than_zero_and_one() {
        let (schema, ty) = schema(TypeDef::bool());
        let codec = Codec::new(&schema);
        assert_eq!(codec.pack(&Value::Bool(true), ty).unwrap(), [1]);
        assert_eq!(codec.unpack(&[0], ty).unwrap(), Value::Bool(false));
        assert_eq!(
            codec.unpack(&[2], ty),
            Err(FracpackError::IntegerOutOfRange {
                bits: 1,
                signed: false
            })
        );
    }

    #[test]
    fn string_is_length_prefixed_utf8() {
        let (schema, ty) = schema(TypeDef::string());
        let codec = Codec::new(&schema);
        let bytes = codec.pack(&Value::from("hi"), ty).unwrap();
        assert_eq!(bytes, [2, 0, 0, 0, b'h', b'i']);
        assert_eq!(codec.unpack(&bytes, ty).unwrap(), Value::from("hi"));
        assert_eq!(
            codec.unpack(&[1, 0, 0, 0, 0xff], ty),
            Err(FracpackError::BadUtf8)
        );
    }

    #[test]
    fn hex_over_fixed_array_checks_length() {
        let (schema, ty) = schema(TypeDef::hex(TypeDef::array(TypeDef::u8(), 4)));
        let codec = Codec::new(&schema);
        let bytes = codec.pack(&Value::Bytes(vec![1, 2, 3, 4]), ty).unwrap();
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert_eq!(
            codec.pack(&Value::Bytes(vec![1, 2]), ty),
            Err(FracpackError::BadSize)
        );
        assert_eq!(codec.frac_to_json(&bytes, ty).unwrap(), "01020304");
    }

    #[test]
    fn hex_over_list_of_u16_needs_whole_elements() {
        let (schema, ty) = schema(TypeDef::hex(TypeDef::list(TypeDef::u16())));
        let codec = Codec::new(&schema);
        assert_eq!(
            codec.pack(&Value::Bytes(vec![1, 2]), ty).unwrap(),
            [2, 0, 0, 0, 1, 2]
        );
        assert_eq!(
            codec.pack(&Value::Bytes(vec![1]), ty),
            Err(FracpackError::BadSize)
        );
        assert_eq!(
            codec.unpack(&[3, 0, 0, 0, 1, 2, 3], ty),
            Err(FracpackError::BadSize)
        );
    }

    #[test]
    fn hex_from_json_reports_bad_digits() {
        let (schema, ty) = schema(TypeDef::hex(TypeDef::list(TypeDef::u8())));
        let codec = Codec::new(&schema);
        assert_eq!(
            codec.value_from_json(&Json::from("0aFF"), ty).unwrap(),
            Value::Bytes(vec![0x0a, 0xff])
        );
        assert_eq!(
            codec.value_from_json(&Json::from("zz"), ty),
            Err(FracpackError::BadHex)
        );
    }

    #[test]
    fn map_over_object_entries() {
        let entry = TypeDef::object([("key", TypeDef::string()), ("value", TypeDef::u32())]);
        let (schema, ty) = schema(TypeDef::custom(TypeDef::list(entry), "map"));
        let codec = Codec::new(&schema);
        let map = Value::Map(vec![
            (Value::from("a"), Value::UInteger(1)),
            (Value::from("b"), Value::UInteger(2)),
        ]);
        let bytes = codec.pack(&map, ty).unwrap();
        assert_eq!(codec.unpack(&bytes, ty).unwrap(), map);

        let from_json = codec
            .value_from_json(&serde_json::json!({"a": 1, "b": 2}), ty)
            .unwrap();
        assert_eq!(from_json, map);
    }

    #[test]
    fn map_over_tuple_entries_accepts_pairs() {
        let entry = TypeDef::tuple([TypeDef::u8(), TypeDef::bool()]);
        let (schema, ty) = schema(TypeDef::custom(TypeDef::list(entry), "map"));
        let codec = Codec::new(&schema);
        let value = codec
            .value_from_json(&serde_json::json!([[1, true], [2, false]]), ty)
            .unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::UInteger(1), Value::Bool(true)),
                (Value::UInteger(2), Value::Bool(false)),
            ])
        );
        let bytes = codec.pack(&value, ty).unwrap();
        assert_eq!(codec.unpack(&bytes, ty).unwrap(), value);
    }

    #[test]
    fn map_that_does_not_fit_degrades_to_list() {
        let (schema, ty) = schema(TypeDef::custom(TypeDef::list(TypeDef::u8()), "map"));
        assert!(matches!(schema.descriptor(ty), TypeDescriptor::Alias(_)));
    }
}
