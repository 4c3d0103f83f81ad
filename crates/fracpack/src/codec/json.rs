//! Schema-directed conversion between JSON and [`Value`].

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::Codec;
use crate::error::{FracpackError, Result};
use crate::types::{TypeDescriptor, TypeId};
use crate::value::Value;

pub(crate) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

pub(crate) fn json_mismatch(expected: &'static str, found: &Json) -> FracpackError {
    FracpackError::TypeMismatch {
        expected,
        found: json_kind(found),
    }
}

fn int_from_json(json: &Json, bits: u32, signed: bool) -> Result<Value> {
    let out_of_range = || FracpackError::IntegerOutOfRange { bits, signed };
    match json {
        Json::Number(n) => {
            if signed {
                n.as_i64().map(Value::Integer).ok_or_else(out_of_range)
            } else {
                n.as_u64().map(Value::UInteger).ok_or_else(out_of_range)
            }
        }
        // 64-bit ints are often carried as strings to survive JSON doubles
        Json::String(s) => {
            if signed {
                s.trim().parse::<i64>().map(Value::Integer).map_err(|_| out_of_range())
            } else {
                s.trim().parse::<u64>().map(Value::UInteger).map_err(|_| out_of_range())
            }
        }
        other => Err(json_mismatch("integer", other)),
    }
}

fn float_from_json(json: &Json) -> Result<Value> {
    match json {
        Json::Number(n) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| json_mismatch("float", json)),
        Json::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| json_mismatch("float", json)),
        other => Err(json_mismatch("float", other)),
    }
}

impl<'a> Codec<'a> {
    /// Converts `json` into a [`Value`] shaped for `ty`.
    ///
    /// Object members missing from the JSON become [`Value::Null`] and fail
    /// on pack unless they are optional. Unknown JSON keys are ignored.
    pub fn value_from_json(&self, json: &Json, ty: TypeId) -> Result<Value> {
        match self.schema.descriptor(ty) {
            TypeDescriptor::Int { bits, is_signed } => int_from_json(json, *bits, *is_signed),
            TypeDescriptor::Float { .. } => float_from_json(json),
            TypeDescriptor::Struct { fields, .. } | TypeDescriptor::Object(fields) => {
                let Json::Object(map) = json else {
                    return Err(json_mismatch("object", json));
                };
                let mut result = IndexMap::with_capacity(fields.len());
                for field in fields {
                    let value = match map.get(&field.name) {
                        Some(member) => self.value_from_json(member, field.ty)?,
                        None => Value::Null,
                    };
                    result.insert(field.name.clone(), value);
                }
                Ok(Value::Object(result))
            }
            TypeDescriptor::Tuple(types) => {
                let Json::Array(items) = json else {
                    return Err(json_mismatch("array", json));
                };
                types
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| match items.get(i) {
                        Some(item) => self.value_from_json(item, *ty),
                        None => Ok(Value::Null),
                    })
                    .collect::<Result<_>>()
                    .map(Value::Array)
            }
            TypeDescriptor::Array { elem, .. } | TypeDescriptor::List(elem) => {
                let Json::Array(items) = json else {
                    return Err(json_mismatch("array", json));
                };
                items
                    .iter()
                    .map(|item| self.value_from_json(item, *elem))
                    .collect::<Result<_>>()
                    .map(Value::Array)
            }
            TypeDescriptor::Option(inner) => match json {
                Json::Null => Ok(Value::Null),
                other => self.value_from_json(other, *inner),
            },
            TypeDescriptor::Variant(alternatives) => {
                let Json::Object(map) = json else {
                    return Err(json_mismatch("variant", json));
                };
                let mut entries = map.iter();
                let (Some((name, inner)), None) = (entries.next(), entries.next()) else {
                    return Err(json_mismatch("variant", json));
                };
                let alt = alternatives
                    .iter()
                    .find(|alt| alt.name == *name)
                    .ok_or_else(|| FracpackError::UnknownAlternativeName(name.clone()))?;
                let value = self.value_from_json(inner, alt.ty)?;
                Ok(Value::variant(name.clone(), value))
            }
            TypeDescriptor::FracPack(inner) => self.value_from_json(json, *inner),
            TypeDescriptor::Custom { repr, id } => match self.handler(id, *repr) {
                Some(handler) => handler.from_json(self, *repr, json),
                None => self.value_from_json(json, *repr),
            },
            TypeDescriptor::Alias(target) => self.value_from_json(json, *target),
        }
    }

    /// Decodes `data` as `ty` and renders it as JSON.
    pub fn frac_to_json(&self, data: &[u8], ty: TypeId) -> Result<Json> {
        Ok(self.unpack(data, ty)?.to_json())
    }

    /// Converts `json` to a value of `ty` and packs it.
    pub fn json_to_frac(&self, json: &Json, ty: TypeId) -> Result<Vec<u8>> {
        let value = self.value_from_json(json, ty)?;
        self.pack(&value, ty)
    }
}
