//! Two-phase resolution of a [`SchemaDef`] into a [`Schema`] arena.
//!
//! Phase 1 walks every named entry in declaration order. Kinds whose layout
//! does not depend on their members (Object, Tuple, List, Option, Variant,
//! FracPack are always a 4-byte offset) get an `Incomplete` slot and are
//! queued. Struct, Array and Custom need their members' layouts right away,
//! so they recurse immediately; reaching a slot that is still
//! `Uninitialized` on that path is a self dependency. Phase 2 drains the
//! queue until it stays empty. Phase 3 checks every custom hook against its
//! resolved representation.

use indexmap::IndexMap;
use log::debug;

use super::def::{SchemaDef, TypeDef};
use super::Schema;
use crate::custom::CustomTypes;
use crate::error::SchemaError;
use crate::types::{Field, Layout, TypeDescriptor, TypeId};

type Result<T> = std::result::Result<T, SchemaError>;

/// Most values a zero-size type may decode into. Such values consume no
/// input, so nothing else bounds them.
const MAX_EMPTY_VALUES: u64 = 1 << 16;

enum Slot {
    Uninitialized,
    Incomplete,
    Ready(TypeDescriptor),
}

struct Loader<'d> {
    def: &'d SchemaDef,
    custom: &'d CustomTypes,
    slots: Vec<Slot>,
    named: Vec<Option<TypeId>>,
    queue: Vec<(TypeId, &'d TypeDef)>,
    customs: Vec<TypeId>,
}

pub(super) fn load(def: &SchemaDef, custom: &CustomTypes) -> Result<Schema> {
    let mut loader = Loader {
        def,
        custom,
        slots: Vec::new(),
        named: vec![None; def.len()],
        queue: Vec::new(),
        customs: Vec::new(),
    };
    for index in 0..def.len() {
        loader.add_named(index)?;
    }
    while !loader.queue.is_empty() {
        for (id, ty) in std::mem::take(&mut loader.queue) {
            loader.complete(id, ty)?;
        }
    }
    loader.finish()
}

impl<'d> Loader<'d> {
    fn push(&mut self) -> TypeId {
        let id = TypeId(self.slots.len() as u32);
        self.slots.push(Slot::Uninitialized);
        id
    }

    fn add(&mut self, ty: &'d TypeDef) -> Result<TypeId> {
        match ty {
            TypeDef::Type(name) => {
                let index = self
                    .def
                    .0
                    .get_index_of(name.as_str())
                    .ok_or_else(|| SchemaError::UnknownType(name.clone()))?;
                self.add_named(index)
            }
            _ => {
                let id = self.push();
                self.fill(id, ty)
            }
        }
    }

    fn add_named(&mut self, index: usize) -> Result<TypeId> {
        let def: &'d SchemaDef = self.def;
        let (name, ty) = def
            .0
            .get_index(index)
            .ok_or_else(|| SchemaError::NotFound(index.to_string()))?;
        if let Some(id) = self.named[index] {
            return match &self.slots[id.index()] {
                Slot::Uninitialized => Err(SchemaError::SelfDependency(name.clone())),
                Slot::Ready(TypeDescriptor::Alias(target)) => Ok(*target),
                _ => Ok(id),
            };
        }
        let id = self.push();
        self.named[index] = Some(id);
        self.fill(id, ty)
    }

    /// Resolves `ty` into slot `id`, returning the id callers should use.
    /// This differs from `id` only for aliases and unregistered customs.
    fn fill(&mut self, id: TypeId, ty: &'d TypeDef) -> Result<TypeId> {
        let (desc, result) = match ty {
            TypeDef::Struct(members) => {
                let mut fields = Vec::with_capacity(members.len());
                let mut region_size: u32 = 0;
                let mut is_variable_size = false;
                for (name, member) in members {
                    let child = self.add(member)?;
                    let layout = self.layout(child)?;
                    is_variable_size |= layout.is_variable_size;
                    region_size = region_size
                        .checked_add(layout.fixed_size)
                        .ok_or_else(|| SchemaError::TooLarge(name.clone()))?;
                    fields.push(Field {
                        name: name.clone(),
                        ty: child,
                    });
                }
                (
                    TypeDescriptor::Struct {
                        fields,
                        region_size,
                        is_variable_size,
                    },
                    id,
                )
            }
            TypeDef::Array { type_, len } => {
                let elem = self.add(type_)?;
                let layout = self.layout(elem)?;
                let too_large = || SchemaError::TooLarge(format!("array of {len}"));
                let len = u32::try_from(*len).map_err(|_| too_large())?;
                let region_size = layout.fixed_size.checked_mul(len).ok_or_else(too_large)?;
                if layout.fixed_size == 0
                    && u64::from(len).saturating_mul(self.empty_values(elem)) > MAX_EMPTY_VALUES
                {
                    return Err(too_large());
                }
                (
                    TypeDescriptor::Array {
                        elem,
                        len,
                        region_size,
                        is_variable_size: layout.is_variable_size,
                    },
                    id,
                )
            }
            TypeDef::Object(_)
            | TypeDef::Tuple(_)
            | TypeDef::List(_)
            | TypeDef::Option(_)
            | TypeDef::Variant(_)
            | TypeDef::FracPack(_) => {
                self.queue.push((id, ty));
                self.slots[id.index()] = Slot::Incomplete;
                return Ok(id);
            }
            TypeDef::Int { bits, is_signed } => {
                if !(1..=64).contains(bits) {
                    return Err(SchemaError::UnsupportedIntBits(*bits));
                }
                (
                    TypeDescriptor::Int {
                        bits: *bits,
                        is_signed: *is_signed,
                    },
                    id,
                )
            }
            TypeDef::Float { exp, mantissa } => {
                if exp.checked_add(*mantissa).is_none() {
                    return Err(SchemaError::TooLarge(format!("float {exp}/{mantissa}")));
                }
                (
                    TypeDescriptor::Float {
                        exp: *exp,
                        mantissa: *mantissa,
                    },
                    id,
                )
            }
            TypeDef::Custom { type_, id: name } => {
                let repr = self.add(type_)?;
                if self.custom.contains(name) {
                    self.customs.push(id);
                    (
                        TypeDescriptor::Custom {
                            repr,
                            id: name.clone(),
                        },
                        id,
                    )
                } else {
                    debug!("no hook registered for custom type `{name}`, using its representation");
                    (TypeDescriptor::Alias(repr), repr)
                }
            }
            TypeDef::Type(_) => {
                let target = self.add(ty)?;
                (TypeDescriptor::Alias(target), target)
            }
        };
        self.slots[id.index()] = Slot::Ready(desc);
        Ok(result)
    }

    fn complete(&mut self, id: TypeId, ty: &'d TypeDef) -> Result<()> {
        let desc = match ty {
            TypeDef::Object(members) => TypeDescriptor::Object(self.add_members(members)?),
            TypeDef::Variant(members) => TypeDescriptor::Variant(self.add_members(members)?),
            TypeDef::Tuple(members) => TypeDescriptor::Tuple(
                members
                    .iter()
                    .map(|m| self.add(m))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeDef::List(elem) => TypeDescriptor::List(self.add(elem)?),
            TypeDef::Option(inner) => TypeDescriptor::Option(self.add(inner)?),
            TypeDef::FracPack(inner) => TypeDescriptor::FracPack(self.add(inner)?),
            _ => return Err(SchemaError::Unresolved(id.0)),
        };
        self.slots[id.index()] = Slot::Ready(desc);
        Ok(())
    }

    fn add_members(&mut self, members: &'d IndexMap<String, TypeDef>) -> Result<Vec<Field>> {
        members
            .iter()
            .map(|(name, member)| {
                Ok(Field {
                    name: name.clone(),
                    ty: self.add(member)?,
                })
            })
            .collect()
    }

    fn layout(&self, id: TypeId) -> Result<Layout> {
        match &self.slots[id.index()] {
            Slot::Uninitialized => Err(SchemaError::SelfDependency(id.to_string())),
            Slot::Incomplete => Ok(Layout::OFFSET),
            Slot::Ready(desc) => {
                // members of Ready descriptors are never Uninitialized
                Ok(desc.layout_with(|t| self.layout(t).unwrap_or(Layout::OFFSET)))
            }
        }
    }

    /// Number of values a zero-size type decodes into, nested ones included.
    fn empty_values(&self, id: TypeId) -> u64 {
        let Slot::Ready(desc) = &self.slots[id.index()] else {
            return 1;
        };
        match desc {
            TypeDescriptor::Struct { fields, .. } => fields
                .iter()
                .fold(1u64, |n, f| n.saturating_add(self.empty_values(f.ty))),
            TypeDescriptor::Array { elem, len, .. } => {
                u64::from(*len).saturating_mul(self.empty_values(*elem)).saturating_add(1)
            }
            TypeDescriptor::Custom { repr: target, .. } | TypeDescriptor::Alias(target) => {
                self.empty_values(*target)
            }
            _ => 1,
        }
    }

    fn finish(self) -> Result<Schema> {
        let types = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Slot::Ready(desc) => Ok(desc),
                _ => Err(SchemaError::Unresolved(i as u32)),
            })
            .collect::<Result<Vec<_>>>()?;
        let mut names = IndexMap::with_capacity(self.def.len());
        for ((name, _), id) in self.def.iter().zip(self.named) {
            let id = id.ok_or_else(|| SchemaError::NotFound(name.clone()))?;
            names.insert(name.clone(), id);
        }
        let mut schema = Schema::from_parts(types, names, self.custom.clone());

        // inner customs were queued first, so their decisions are already in
        for id in self.customs {
            let TypeDescriptor::Custom { repr, id: name } = schema.descriptor(id).clone() else {
                continue;
            };
            let target = schema.structural(repr);
            let matched = self
                .custom
                .get(&name)
                .is_some_and(|handler| handler.matches(&schema, target));
            if matched {
                schema.set_descriptor(id, TypeDescriptor::Custom { repr: target, id: name });
            } else {
                debug!(
                    "custom type `{name}` does not match {} representation, using it as a plain type",
                    schema.descriptor(target).kind_name()
                );
                schema.set_descriptor(id, TypeDescriptor::Alias(target));
            }
        }
        debug!(
            "loaded schema: {} named types, {} descriptors",
            schema.names().count(),
            schema.len()
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::standard_types;
    use serde_json::json;

    fn load_json(value: serde_json::Value) -> Result<Schema> {
        let def: SchemaDef = serde_json::from_value(value).unwrap();
        Schema::load(&def, &standard_types())
    }

    #[test]
    fn alias_chain_resolves_to_target() {
        let schema = load_json(json!({
            "a": "b",
            "b": "c",
            "c": {"Int": {"bits": 16, "isSigned": true}},
        }))
        .unwrap();
        let a = schema.type_id("a").unwrap();
        assert_eq!(
            schema.descriptor(schema.resolve(a)),
            &TypeDescriptor::Int {
                bits: 16,
                is_signed: true
            }
        );
        assert_eq!(schema.layout(a), Layout::fixed(2));
    }

    #[test]
    fn self_alias_is_rejected() {
        let err = load_json(json!({"a": "a"})).unwrap_err();
        assert_eq!(err, SchemaError::SelfDependency("a".into()));
    }

    #[test]
    fn struct_containing_itself_is_rejected() {
        let err = load_json(json!({"s": {"Struct": {"x": "s"}}})).unwrap_err();
        assert_eq!(err, SchemaError::SelfDependency("s".into()));
    }

    #[test]
    fn recursion_through_object_is_allowed() {
        let schema = load_json(json!({
            "Node": {"Object": {"next": {"Option": "Node"}}},
        }))
        .unwrap();
        let node = schema.type_id("Node").unwrap();
        let TypeDescriptor::Object(fields) = schema.descriptor(node) else {
            panic!("expected object");
        };
        let TypeDescriptor::Option(inner) = schema.descriptor(fields[0].ty) else {
            panic!("expected option");
        };
        assert_eq!(schema.resolve(*inner), node);
    }

    #[test]
    fn unknown_reference() {
        let err = load_json(json!({"a": {"List": "missing"}})).unwrap_err();
        assert_eq!(err, SchemaError::UnknownType("missing".into()));
    }

    #[test]
    fn unsupported_int_width() {
        let err = load_json(json!({"a": {"Int": {"bits": 65, "isSigned": false}}})).unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedIntBits(65));
    }

    #[test]
    fn mismatched_hook_becomes_alias() {
        let schema = load_json(json!({
            "s": {"Custom": {"type": {"Int": {"bits": 32, "isSigned": false}}, "id": "string"}},
            "b": {"Custom": {"type": {"Int": {"bits": 1, "isSigned": false}}, "id": "bool"}},
            "x": {"Custom": {"type": {"Int": {"bits": 8, "isSigned": false}}, "id": "nope"}},
        }))
        .unwrap();
        assert!(matches!(
            schema.get("s"),
            Some(TypeDescriptor::Int { bits: 32, .. })
        ));
        assert!(matches!(
            schema.get("b"),
            Some(TypeDescriptor::Custom { id, .. }) if id == "bool"
        ));
        assert!(matches!(
            schema.get("x"),
            Some(TypeDescriptor::Int { bits: 8, .. })
        ));
    }

    #[test]
    fn struct_with_variable_member_is_offset_sized() {
        let schema = load_json(json!({
            "s": {"Struct": {"a": {"Int": {"bits": 32, "isSigned": false}}, "b": {"List": {"Int": {"bits": 8, "isSigned": false}}}}},
            "f": {"Struct": {"a": {"Int": {"bits": 32, "isSigned": false}}, "b": {"Int": {"bits": 8, "isSigned": false}}}},
        }))
        .unwrap();
        let s = schema.type_id("s").unwrap();
        let f = schema.type_id("f").unwrap();
        assert_eq!(schema.layout(s), Layout::OFFSET);
        assert_eq!(schema.layout(f), Layout::fixed(5));
        assert!(matches!(
            schema.descriptor(s),
            TypeDescriptor::Struct { region_size: 8, is_variable_size: true, .. }
        ));
    }
}
