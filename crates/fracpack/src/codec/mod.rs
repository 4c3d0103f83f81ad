//! Schema-directed pack/unpack.
//!
//! Every type kind has a top-level encoding (`pack_value` /
//! `unpack_value`) and an embedded encoding used when the value is a member
//! of an enclosing fixed region (`embedded_pack` / `embedded_unpack`).
//! Fixed-size members are embedded inline; variable-size members get a
//! 4-byte offset slot whose payload is written after every slot of the
//! enclosing aggregate.

mod aggregate;
mod embedded;
mod json;
mod scalar;

pub use embedded::Deferred;
pub(crate) use json::json_mismatch;

use std::cell::Cell;
use std::sync::Arc;

use fracpack_buffers::{InputStream, OutputStream};
use log::debug;

use crate::custom::{CustomHandler, CustomTypes};
use crate::error::{FracpackError, Result};
use crate::options::CodecOptions;
use crate::schema::Schema;
use crate::types::{TypeDescriptor, TypeId};
use crate::value::Value;

pub(crate) static NULL: Value = Value::Null;

/// Packs and unpacks [`Value`]s against the types of one [`Schema`].
///
/// A codec is cheap to build and meant to be used per call site; it keeps
/// a decode depth counter and is therefore not `Sync`.
///
/// ```
/// use fracpack::{Codec, CustomTypes, Schema, SchemaDef, TypeDef, Value};
///
/// let def = SchemaDef::new().with("u32", TypeDef::u32());
/// let schema = Schema::load(&def, &CustomTypes::new()).unwrap();
/// let ty = schema.type_id("u32").unwrap();
///
/// let codec = Codec::new(&schema);
/// let bytes = codec.pack(&Value::UInteger(10), ty).unwrap();
/// assert_eq!(bytes, [0x0a, 0x00, 0x00, 0x00]);
/// assert_eq!(codec.unpack(&bytes, ty).unwrap(), Value::UInteger(10));
/// ```
#[derive(Debug, Clone)]
pub struct Codec<'a> {
    schema: &'a Schema,
    overrides: Option<&'a CustomTypes>,
    options: CodecOptions,
    depth: Cell<usize>,
}

impl<'a> Codec<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            overrides: None,
            options: CodecOptions::default(),
            depth: Cell::new(0),
        }
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Per-call hooks that take precedence over the schema's own hooks for
    /// the same id, as long as they match the representation.
    pub fn with_overrides(mut self, overrides: &'a CustomTypes) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn pack(&self, value: &Value, ty: TypeId) -> Result<Vec<u8>> {
        let mut out = OutputStream::new();
        self.pack_into(value, ty, &mut out)?;
        Ok(out.finish())
    }

    pub fn pack_into(&self, value: &Value, ty: TypeId, out: &mut OutputStream) -> Result<()> {
        self.pack_value(value, ty, out)
    }

    /// Unpacks a whole buffer. Bytes left over after the value are an error
    /// unless an unknown field made the end of the data unknowable.
    pub fn unpack(&self, data: &[u8], ty: TypeId) -> Result<Value> {
        let mut input = InputStream::new(data);
        let value = self.unpack_from(&mut input, ty)?;
        if input.known_pos() && input.remaining() != 0 {
            return Err(FracpackError::ExtraData);
        }
        Ok(value)
    }

    pub fn unpack_from(&self, input: &mut InputStream<'_>, ty: TypeId) -> Result<Value> {
        self.unpack_value(ty, input)
    }

    /// Looks up the hook for a custom type, preferring a matching override.
    pub(crate) fn handler(&self, id: &str, repr: TypeId) -> Option<&'a Arc<dyn CustomHandler>> {
        if let Some(handler) = self.overrides.and_then(|o| o.get(id)) {
            if handler.matches(self.schema, repr) {
                return Some(handler);
            }
            debug!("override for custom type `{id}` does not match its representation, using the schema hook");
        }
        self.schema.custom_types().get(id)
    }

    /// Writes the top-level encoding of `value` as `ty`.
    pub fn pack_value(&self, value: &Value, ty: TypeId, out: &mut OutputStream) -> Result<()> {
        match self.schema.descriptor(ty) {
            TypeDescriptor::Int { bits, is_signed } => scalar::pack_int(value, *bits, *is_signed, out),
            TypeDescriptor::Float { exp, mantissa } => {
                scalar::pack_float(value, *exp, *mantissa, out)
            }
            TypeDescriptor::Struct { fields, .. } => self.pack_struct(fields, value, out),
            TypeDescriptor::Object(fields) => self.pack_object(fields, value, out),
            TypeDescriptor::Tuple(types) => self.pack_tuple(types, value, out),
            TypeDescriptor::Array { elem, len, .. } => self.pack_array(*elem, *len, value, out),
            TypeDescriptor::List(elem) => self.pack_list(*elem, value, out),
            TypeDescriptor::Option(_) => self.pack_option(ty, value, out),
            TypeDescriptor::Variant(alternatives) => self.pack_variant(alternatives, value, out),
            TypeDescriptor::FracPack(inner) => self.pack_fracpack(*inner, value, out),
            TypeDescriptor::Custom { repr, id } => match self.handler(id, *repr) {
                Some(handler) => handler.pack(self, *repr, value, out),
                None => self.pack_value(value, *repr, out),
            },
            TypeDescriptor::Alias(target) => self.pack_value(value, *target, out),
        }
    }

    /// Reads the top-level encoding of `ty` at the cursor.
    pub fn unpack_value(&self, ty: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            return Err(FracpackError::DepthLimitExceeded);
        }
        self.depth.set(depth + 1);
        let result = self.unpack_kind(ty, input);
        self.depth.set(depth);
        result
    }

    fn unpack_kind(&self, ty: TypeId, input: &mut InputStream<'_>) -> Result<Value> {
        match self.schema.descriptor(ty) {
            TypeDescriptor::Int { bits, is_signed } => scalar::unpack_int(*bits, *is_signed, input),
            TypeDescriptor::Float { exp, mantissa } => scalar::unpack_float(*exp, *mantissa, input),
            TypeDescriptor::Struct {
                fields,
                region_size,
                ..
            } => self.unpack_struct(fields, *region_size, input),
            TypeDescriptor::Object(fields) => self.unpack_object(fields, input),
            TypeDescriptor::Tuple(types) => self.unpack_tuple(types, input),
            TypeDescriptor::Array {
                elem,
                len,
                region_size,
                ..
            } => self.unpack_array(*elem, *len, *region_size, input),
            TypeDescriptor::List(elem) => self.unpack_list(*elem, input),
            TypeDescriptor::Option(_) => self.unpack_option(ty, input),
            TypeDescriptor::Variant(alternatives) => self.unpack_variant(alternatives, input),
            TypeDescriptor::FracPack(inner) => self.unpack_fracpack(*inner, input),
            TypeDescriptor::Custom { repr, id } => match self.handler(id, *repr) {
                Some(handler) => handler.unpack(self, *repr, input),
                None => self.unpack_value(*repr, input),
            },
            TypeDescriptor::Alias(target) => self.unpack_value(*target, input),
        }
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> FracpackError {
    FracpackError::TypeMismatch {
        expected,
        found: found.kind_name(),
    }
}
