//! Layout rules for structs, objects, tuples, arrays, lists, options,
//! variants and nested fracpack payloads.

use fracpack_buffers::{InputStream, OutputStream};
use indexmap::IndexMap;
use log::trace;

use super::{mismatch, Codec, NULL};
use crate::error::{FracpackError, Result};
use crate::types::{Field, TypeId};
use crate::value::Value;

/// Writes each member into the current fixed region, then the deferred
/// payloads.
fn pack_members<'v>(
    codec: &Codec<'_>,
    members: impl Iterator<Item = (TypeId, &'v Value)>,
    out: &mut OutputStream,
) -> Result<()> {
    let mut deferred = Vec::new();
    for (ty, value) in members {
        if let Some(d) = codec.embedded_pack(value, ty, out)? {
            deferred.push(d);
        }
    }
    codec.run_deferred(deferred, out)
}

fn object_fields<'v>(
    codec: &Codec<'_>,
    fields: &[Field],
    value: &'v Value,
) -> Result<Vec<(TypeId, &'v Value)>> {
    let Value::Object(map) = value else {
        return Err(mismatch("object", value));
    };
    fields
        .iter()
        .map(|field| {
            let member = map.get(&field.name).unwrap_or(&NULL);
            if member.is_null() && !codec.schema.is_optional(field.ty) {
                return Err(FracpackError::MissingField(field.name.clone()));
            }
            Ok((field.ty, member))
        })
        .collect()
}

fn tuple_members<'v>(
    codec: &Codec<'_>,
    types: &[TypeId],
    value: &'v Value,
) -> Result<Vec<(TypeId, &'v Value)>> {
    let Value::Array(items) = value else {
        return Err(mismatch("array", value));
    };
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let member = items.get(i).unwrap_or(&NULL);
            if member.is_null() && !codec.schema.is_optional(*ty) {
                return Err(FracpackError::MissingField(i.to_string()));
            }
            Ok((*ty, member))
        })
        .collect()
}

impl<'a> Codec<'a> {
    pub(super) fn pack_struct(&self, fields: &[Field], value: &Value, out: &mut OutputStream) -> Result<()> {
        let members = object_fields(self, fields, value)?;
        pack_members(self, members.into_iter(), out)
    }

    pub(super) fn unpack_struct(
        &self,
        fields: &[Field],
        region_size: u32,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let mut fixed_pos = input.position();
        input.advance(region_size)?;
        let mut result = IndexMap::with_capacity(fields.len());
        for field in fields {
            let value = self.embedded_unpack(field.ty, fixed_pos, input)?;
            fixed_pos += self.schema.layout(field.ty).fixed_size;
            result.insert(field.name.clone(), value);
        }
        Ok(Value::Object(result))
    }

    pub(super) fn pack_object(&self, fields: &[Field], value: &Value, out: &mut OutputStream) -> Result<()> {
        let members = object_fields(self, fields, value)?;
        self.pack_extensible(&members, out)
    }

    pub(super) fn unpack_object(&self, fields: &[Field], input: &mut InputStream<'_>) -> Result<Value> {
        let types: Vec<TypeId> = fields.iter().map(|f| f.ty).collect();
        let values = self.unpack_extensible(&types, |i| fields[i].name.clone(), input)?;
        Ok(Value::Object(
            fields
                .iter()
                .map(|f| f.name.clone())
                .zip(values)
                .collect(),
        ))
    }

    pub(super) fn pack_tuple(&self, types: &[TypeId], value: &Value, out: &mut OutputStream) -> Result<()> {
        let members = tuple_members(self, types, value)?;
        self.pack_extensible(&members, out)
    }

    pub(super) fn unpack_tuple(&self, types: &[TypeId], input: &mut InputStream<'_>) -> Result<Value> {
        let values = self.unpack_extensible(types, |i| i.to_string(), input)?;
        Ok(Value::Array(values))
    }

    /// Object/Tuple: a u16 header size, then the slots of every member up to
    /// the last one that is not an absent option.
    fn pack_extensible(&self, members: &[(TypeId, &Value)], out: &mut OutputStream) -> Result<()> {
        let mut n = members.len();
        while n > 0 {
            let (ty, value) = members[n - 1];
            if !(value.is_null() && self.schema.is_optional(ty)) {
                break;
            }
            n -= 1;
        }
        let header: u64 = members[..n]
            .iter()
            .map(|(ty, _)| self.schema.layout(*ty).fixed_size as u64)
            .sum();
        let header = u16::try_from(header).map_err(|_| FracpackError::BadSize)?;
        out.write_u16(header);
        pack_members(self, members[..n].iter().copied(), out)
    }

    fn unpack_extensible(
        &self,
        types: &[TypeId],
        name_of: impl Fn(usize) -> String,
        input: &mut InputStream<'_>,
    ) -> Result<Vec<Value>> {
        let header = input.read_u16()? as u32;
        let fixed_start = input.position();
        input.advance(header)?;
        let fixed_end = fixed_start + header;
        let mut fixed_pos = fixed_start;
        let mut last_empty = false;
        let mut values = Vec::with_capacity(types.len());
        for (i, &ty) in types.iter().enumerate() {
            let size = self.schema.layout(ty).fixed_size;
            let remaining = fixed_end - fixed_pos;
            if remaining < size {
                if remaining != 0 {
                    return Err(FracpackError::BadSize);
                }
                if !self.schema.is_optional(ty) {
                    return Err(FracpackError::MissingField(name_of(i)));
                }
                values.push(Value::Null);
                continue;
            }
            if size != 0 {
                last_empty =
                    self.schema.is_optional(ty) && input.read_u32_at(fixed_pos)? == 1;
            }
            values.push(self.embedded_unpack(ty, fixed_pos, input)?);
            fixed_pos += size;
        }
        if fixed_pos < fixed_end {
            if !self.options.allow_unknown_fields {
                return Err(FracpackError::UnknownField);
            }
            let extra = fixed_end - fixed_pos;
            if extra % 4 != 0 {
                return Err(FracpackError::BadSize);
            }
            trace!("skipping {} unknown trailing field(s)", extra / 4);
            while fixed_pos < fixed_end {
                let tag = input.read_u32_at(fixed_pos)?;
                last_empty = tag == 1;
                if tag > 1 {
                    let target = fixed_pos
                        .checked_add(tag)
                        .ok_or(FracpackError::OutOfBounds)?;
                    input.set_position(target)?;
                    // the payload's length is unknown from here on
                    input.set_unknown_pos();
                }
                fixed_pos += 4;
            }
        }
        if last_empty {
            return Err(FracpackError::LastOptionalMustNotBeEmpty);
        }
        Ok(values)
    }

    pub(super) fn pack_array(&self, elem: TypeId, len: u32, value: &Value, out: &mut OutputStream) -> Result<()> {
        let Value::Array(items) = value else {
            return Err(mismatch("array", value));
        };
        if items.len() != len as usize {
            return Err(FracpackError::BadSize);
        }
        pack_members(self, items.iter().map(|item| (elem, item)), out)
    }

    pub(super) fn unpack_array(
        &self,
        elem: TypeId,
        len: u32,
        region_size: u32,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let fixed_start = input.position();
        input.advance(region_size)?;
        self.unpack_elements(elem, fixed_start, len, input)
    }

    fn unpack_elements(
        &self,
        elem: TypeId,
        fixed_start: u32,
        count: u32,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let size = self.schema.layout(elem).fixed_size;
        let mut items = Vec::with_capacity(count as usize);
        let mut fixed_pos = fixed_start;
        for _ in 0..count {
            items.push(self.embedded_unpack(elem, fixed_pos, input)?);
            fixed_pos += size;
        }
        Ok(Value::Array(items))
    }

    /// List: u32 size of the slot region, then the slots, then payloads.
    pub(super) fn pack_list(&self, elem: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        let Value::Array(items) = value else {
            return Err(mismatch("array", value));
        };
        let size = self.schema.layout(elem).fixed_size;
        if size == 0 && !items.is_empty() {
            return Err(FracpackError::BadSize);
        }
        let byte_len = u32::try_from(items.len() as u64 * size as u64)
            .map_err(|_| FracpackError::BadSize)?;
        out.write_u32(byte_len);
        pack_members(self, items.iter().map(|item| (elem, item)), out)
    }

    pub(super) fn unpack_list(&self, elem: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let byte_len = input.read_u32()?;
        let size = self.schema.layout(elem).fixed_size;
        if size == 0 {
            return if byte_len == 0 {
                Ok(Value::Array(Vec::new()))
            } else {
                Err(FracpackError::BadSize)
            };
        }
        if byte_len % size != 0 {
            return Err(FracpackError::BadSize);
        }
        let fixed_start = input.position();
        input.advance(byte_len)?;
        self.unpack_elements(elem, fixed_start, byte_len / size, input)
    }

    /// A top-level option is a single slot followed by its payload.
    pub(super) fn pack_option(&self, ty: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        pack_members(self, std::iter::once((ty, value)), out)
    }

    pub(super) fn unpack_option(&self, ty: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let slot = input.position();
        input.advance(4)?;
        self.embedded_unpack(ty, slot, input)
    }

    /// Variant: u8 alternative index, u32 payload size, payload.
    pub(super) fn pack_variant(
        &self,
        alternatives: &[Field],
        value: &Value,
        out: &mut OutputStream,
    ) -> Result<()> {
        let Value::Variant(name, inner) = value else {
            return Err(mismatch("variant", value));
        };
        let index = alternatives
            .iter()
            .position(|alt| alt.name == *name)
            .ok_or_else(|| FracpackError::UnknownAlternativeName(name.clone()))?;
        let tag = u8::try_from(index).map_err(|_| FracpackError::BadSize)?;
        out.write_u8(tag);
        self.pack_sized(alternatives[index].ty, inner, out)
    }

    pub(super) fn unpack_variant(&self, alternatives: &[Field], input: &mut InputStream<'_>) -> Result<Value> {
        let tag = input.read_u8()?;
        let size = input.read_u32()?;
        let alt = alternatives
            .get(tag as usize)
            .ok_or(FracpackError::UnknownAlternative(tag))?;
        // a newer writer may append data to the alternative's payload
        let inner = self.unpack_window(alt.ty, size, false, input)?;
        Ok(Value::Variant(alt.name.clone(), Box::new(inner)))
    }

    /// FracPack: u32 payload size, then the nested encoding.
    pub(super) fn pack_fracpack(&self, inner: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        self.pack_sized(inner, value, out)
    }

    pub(super) fn unpack_fracpack(&self, inner: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let size = input.read_u32()?;
        self.unpack_window(inner, size, true, input)
    }

    fn pack_sized(&self, ty: TypeId, value: &Value, out: &mut OutputStream) -> Result<()> {
        let size_pos = out.position();
        out.write_u32(0);
        self.pack_value(value, ty, out)?;
        let size = out.position() - size_pos - 4;
        out.patch_u32(size_pos, size);
        Ok(())
    }

    /// Decodes `ty` inside the next `size` bytes and leaves the cursor at
    /// the end of that window. With `exact`, the value must fill the window
    /// whenever that can be checked.
    fn unpack_window(
        &self,
        ty: TypeId,
        size: u32,
        exact: bool,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let end = input
            .position()
            .checked_add(size)
            .ok_or(FracpackError::OutOfBounds)?;
        let outer_known = input.known_pos();
        let outer_end = input.limit(end)?;
        input.set_known_pos(true);
        let result = self.unpack_value(ty, input).and_then(|value| {
            if exact && input.known_pos() && input.position() != end {
                Err(FracpackError::ExtraData)
            } else {
                Ok(value)
            }
        });
        input.unlimit(outer_end);
        input.set_known_pos(outer_known);
        let value = result?;
        input.seek(end)?;
        Ok(value)
    }
}
