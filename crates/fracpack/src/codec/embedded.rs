//! Offset indirection shared by every aggregate.

use fracpack_buffers::{InputStream, OutputStream};

use super::Codec;
use crate::error::{FracpackError, Result};
use crate::types::{Layout, TypeDescriptor, TypeId};
use crate::value::Value;

/// A payload whose 4-byte offset slot has been reserved but not yet
/// patched.
///
/// Deferred payloads of one aggregate run in member order after all of its
/// slots have been written.
#[derive(Debug)]
pub struct Deferred<'v> {
    slot: u32,
    ty: TypeId,
    value: &'v Value,
}

impl<'a> Codec<'a> {
    /// Writes `value` into the enclosing fixed region.
    ///
    /// Fixed-size values are written inline. Variable-size values reserve an
    /// offset slot; empty containers get offset 0 and no payload, absent
    /// options get 1. Anything else returns the payload still to be written.
    pub fn embedded_pack<'v>(
        &self,
        value: &'v Value,
        ty: TypeId,
        out: &mut OutputStream,
    ) -> Result<Option<Deferred<'v>>> {
        let schema = self.schema;
        let payload_ty = match schema.descriptor(schema.resolve(ty)) {
            TypeDescriptor::Option(inner) => {
                if value.is_null() {
                    out.write_u32(1);
                    return Ok(None);
                }
                *inner
            }
            _ => {
                if !schema.layout(ty).is_variable_size {
                    self.pack_value(value, ty, out)?;
                    return Ok(None);
                }
                ty
            }
        };
        if self.is_empty_container(payload_ty, value) {
            out.write_u32(0);
            return Ok(None);
        }
        let slot = out.position();
        out.write_u32(0);
        Ok(Some(Deferred {
            slot,
            ty: payload_ty,
            value,
        }))
    }

    /// Patches each slot with the distance to its payload, then writes the
    /// payload.
    pub fn run_deferred(&self, deferred: Vec<Deferred<'_>>, out: &mut OutputStream) -> Result<()> {
        for d in deferred {
            let pos = out.position();
            out.patch_u32(d.slot, pos - d.slot);
            self.pack_value(d.value, d.ty, out)?;
        }
        Ok(())
    }

    /// Reads a member whose slot starts at `fixed_pos`. The cursor must be
    /// at the enclosing aggregate's payload area.
    pub fn embedded_unpack(
        &self,
        ty: TypeId,
        fixed_pos: u32,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let schema = self.schema;
        if let TypeDescriptor::Option(inner) = schema.descriptor(schema.resolve(ty)) {
            let offset = input.read_u32_at(fixed_pos)?;
            if offset == 1 {
                return Ok(Value::Null);
            }
            return self.unpack_offset(*inner, fixed_pos, offset, input);
        }
        if !schema.layout(ty).is_variable_size {
            return input.scoped(fixed_pos, |input| self.unpack_value(ty, input));
        }
        let offset = input.read_u32_at(fixed_pos)?;
        self.unpack_offset(ty, fixed_pos, offset, input)
    }

    fn unpack_offset(
        &self,
        ty: TypeId,
        slot: u32,
        offset: u32,
        input: &mut InputStream<'_>,
    ) -> Result<Value> {
        let container = self.schema.is_container(ty);
        if offset == 0 {
            return if container {
                self.new_empty_container(ty)
            } else {
                Err(FracpackError::BadOffset)
            };
        }
        let target = slot.checked_add(offset).ok_or(FracpackError::OutOfBounds)?;
        input.set_position(target)?;
        let value = self.unpack_value(ty, input)?;
        if container && self.is_empty_container(ty, &value) {
            return Err(FracpackError::BadEmptyEncoding);
        }
        Ok(value)
    }

    /// Whether `value` is the canonical empty value of `ty`. Always false for
    /// types that are not containers.
    pub fn is_empty_container(&self, ty: TypeId, value: &Value) -> bool {
        let schema = self.schema;
        if !schema.is_container(ty) {
            return false;
        }
        match schema.descriptor(schema.resolve(ty)) {
            TypeDescriptor::List(_) => matches!(value, Value::Array(items) if items.is_empty()),
            // the only FracPack payload that can be empty is one whose inner
            // type always packs to zero bytes
            TypeDescriptor::FracPack(inner) => schema.layout(*inner) == Layout::fixed(0),
            TypeDescriptor::Custom { repr, id } => match self.handler(id, *repr) {
                Some(handler) => handler.is_empty_container(self, *repr, value),
                None => self.is_empty_container(*repr, value),
            },
            _ => false,
        }
    }

    /// The value an offset of 0 stands for.
    pub fn new_empty_container(&self, ty: TypeId) -> Result<Value> {
        let schema = self.schema;
        match schema.descriptor(schema.resolve(ty)) {
            TypeDescriptor::List(_) => Ok(Value::Array(Vec::new())),
            TypeDescriptor::FracPack(inner) => {
                let mut input = InputStream::new(&[]);
                self.unpack_value(*inner, &mut input)
            }
            TypeDescriptor::Custom { repr, id } => match self.handler(id, *repr) {
                Some(handler) => handler.new_empty_container(self, *repr),
                None => self.new_empty_container(*repr),
            },
            _ => Err(FracpackError::BadOffset),
        }
    }
}
