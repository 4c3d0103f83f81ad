//! Resolved type descriptors.
//!
//! Every descriptor lives in a [`Schema`](crate::Schema) arena and refers to
//! other descriptors by [`TypeId`], so recursive and forward references need
//! no shared ownership.

use std::fmt;

/// Index of a descriptor inside its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named member of a Struct, Object or Variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

/// How a type occupies an enclosing fixed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Bytes used inline. Always 4 for variable-size types.
    pub fixed_size: u32,
    /// Whether the inline bytes are an offset to a separate payload.
    pub is_variable_size: bool,
}

impl Layout {
    pub const OFFSET: Layout = Layout {
        fixed_size: 4,
        is_variable_size: true,
    };

    pub const fn fixed(size: u32) -> Self {
        Layout {
            fixed_size: size,
            is_variable_size: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Int {
        bits: u32,
        is_signed: bool,
    },
    Float {
        exp: u32,
        mantissa: u32,
    },
    /// Header-less record. `region_size` is the size of the member slots.
    Struct {
        fields: Vec<Field>,
        region_size: u32,
        is_variable_size: bool,
    },
    Object(Vec<Field>),
    Tuple(Vec<TypeId>),
    Array {
        elem: TypeId,
        len: u32,
        region_size: u32,
        is_variable_size: bool,
    },
    List(TypeId),
    Option(TypeId),
    Variant(Vec<Field>),
    FracPack(TypeId),
    /// A representation handled by the registered hook `id`.
    Custom {
        repr: TypeId,
        id: String,
    },
    /// A named reference, already resolved to its target.
    Alias(TypeId),
}

impl TypeDescriptor {
    /// Short name of the descriptor's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Int { .. } => "Int",
            TypeDescriptor::Float { .. } => "Float",
            TypeDescriptor::Struct { .. } => "Struct",
            TypeDescriptor::Object(_) => "Object",
            TypeDescriptor::Tuple(_) => "Tuple",
            TypeDescriptor::Array { .. } => "Array",
            TypeDescriptor::List(_) => "List",
            TypeDescriptor::Option(_) => "Option",
            TypeDescriptor::Variant(_) => "Variant",
            TypeDescriptor::FracPack(_) => "FracPack",
            TypeDescriptor::Custom { .. } => "Custom",
            TypeDescriptor::Alias(_) => "Alias",
        }
    }

    /// Layout of this descriptor; `layout_of` answers for referenced types.
    pub(crate) fn layout_with(&self, layout_of: impl Fn(TypeId) -> Layout) -> Layout {
        match self {
            TypeDescriptor::Int { bits, .. } => Layout::fixed(bits.div_ceil(8)),
            TypeDescriptor::Float { exp, mantissa } => Layout::fixed((exp + mantissa).div_ceil(8)),
            TypeDescriptor::Struct {
                region_size,
                is_variable_size,
                ..
            }
            | TypeDescriptor::Array {
                region_size,
                is_variable_size,
                ..
            } => {
                if *is_variable_size {
                    Layout::OFFSET
                } else {
                    Layout::fixed(*region_size)
                }
            }
            TypeDescriptor::Custom { repr: target, .. } | TypeDescriptor::Alias(target) => {
                layout_of(*target)
            }
            TypeDescriptor::Object(_)
            | TypeDescriptor::Tuple(_)
            | TypeDescriptor::List(_)
            | TypeDescriptor::Option(_)
            | TypeDescriptor::Variant(_)
            | TypeDescriptor::FracPack(_) => Layout::OFFSET,
        }
    }
}
