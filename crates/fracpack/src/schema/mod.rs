//! Schema description, loader and the resolved descriptor arena.

mod def;
mod loader;

pub use def::{SchemaDef, TypeDef};

use indexmap::IndexMap;

use crate::codec::Codec;
use crate::custom::CustomTypes;
use crate::error::{Result, SchemaError};
use crate::types::{Layout, TypeDescriptor, TypeId};
use crate::value::Value;

/// A resolved, immutable type graph.
///
/// Built once by [`Schema::load`]; may contain cycles through
/// Object/Tuple/List/Option/Variant/FracPack members. Safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct Schema {
    types: Vec<TypeDescriptor>,
    names: IndexMap<String, TypeId>,
    custom: CustomTypes,
}

impl Schema {
    /// Resolves `def` against the custom hooks in `custom`.
    pub fn load(def: &SchemaDef, custom: &CustomTypes) -> std::result::Result<Schema, SchemaError> {
        loader::load(def, custom)
    }

    pub(crate) fn from_parts(
        types: Vec<TypeDescriptor>,
        names: IndexMap<String, TypeId>,
        custom: CustomTypes,
    ) -> Self {
        Schema {
            types,
            names,
            custom,
        }
    }

    pub(crate) fn set_descriptor(&mut self, id: TypeId, desc: TypeDescriptor) {
        self.types[id.index()] = desc;
    }

    /// Id of a named type.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Like [`Schema::type_id`], failing with `SchemaError::NotFound`.
    pub fn require(&self, name: &str) -> std::result::Result<TypeId, SchemaError> {
        self.type_id(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_owned()))
    }

    /// Descriptor of a named type, with aliases followed.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.type_id(name).map(|id| self.descriptor(self.resolve(id)))
    }

    /// Raw descriptor for `id`. Panics if `id` belongs to another schema.
    pub fn descriptor(&self, id: TypeId) -> &TypeDescriptor {
        &self.types[id.index()]
    }

    /// Follows `Alias` links.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        while let TypeDescriptor::Alias(target) = self.descriptor(id) {
            id = *target;
        }
        id
    }

    /// Follows `Alias` links and unwraps `Custom` hooks down to the
    /// structural representation.
    pub fn structural(&self, mut id: TypeId) -> TypeId {
        loop {
            match self.descriptor(id) {
                TypeDescriptor::Alias(target) | TypeDescriptor::Custom { repr: target, .. } => {
                    id = *target
                }
                _ => return id,
            }
        }
    }

    pub fn layout(&self, id: TypeId) -> Layout {
        self.descriptor(id).layout_with(|t| self.layout(t))
    }

    pub fn is_optional(&self, id: TypeId) -> bool {
        matches!(self.descriptor(self.resolve(id)), TypeDescriptor::Option(_))
    }

    /// Whether the type has a canonical empty value encoded as offset 0.
    pub fn is_container(&self, id: TypeId) -> bool {
        match self.descriptor(self.resolve(id)) {
            TypeDescriptor::List(_) | TypeDescriptor::FracPack(_) => true,
            TypeDescriptor::Custom { repr, .. } => self.is_container(*repr),
            _ => false,
        }
    }

    /// Number of descriptors in the arena.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Named types in declaration order.
    pub fn names(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// The hooks this schema was loaded with.
    pub fn custom_types(&self) -> &CustomTypes {
        &self.custom
    }

    /// A codec over this schema with default options.
    pub fn codec(&self) -> Codec<'_> {
        Codec::new(self)
    }

    /// Packs `value` as the named type.
    pub fn pack(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let ty = self.require(name)?;
        self.codec().pack(value, ty)
    }

    /// Unpacks `data` as the named type, requiring all input to be consumed.
    pub fn unpack(&self, name: &str, data: &[u8]) -> Result<Value> {
        let ty = self.require(name)?;
        self.codec().unpack(data, ty)
    }
}

