//! Structural compatibility between two resolved schemas.
//!
//! [`SchemaMatcher`] decides whether data written with one type graph (the
//! right-hand side) can be read with another (the left-hand side), and
//! records how they differ. Recursive graphs are compared by walking both
//! sides in lock-step: when a pair of nodes is reached again while both are
//! still being compared, the cycle is closed if they were entered at the
//! same depth.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::schema::Schema;
use crate::types::{TypeDescriptor, TypeId};

/// How two compatible types differ. All flags clear means equivalent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompatibilityResult {
    /// The right-hand side has optional members the left does not.
    pub add_field: bool,
    /// The left-hand side has optional members the right does not.
    pub drop_field: bool,
    /// The right-hand side has more variant alternatives, or a nested
    /// fracpack payload where the left has bytes.
    pub add_alternative: bool,
    /// The opposite of `add_alternative`.
    pub drop_alternative: bool,
}

impl CompatibilityResult {
    pub const EQUIVALENT: Self = CompatibilityResult {
        add_field: false,
        drop_field: false,
        add_alternative: false,
        drop_alternative: false,
    };

    pub fn is_equivalent(&self) -> bool {
        *self == Self::EQUIVALENT
    }

    /// Only additions, and at least one.
    pub fn is_upgrade(&self) -> bool {
        (self.add_field || self.add_alternative) && !self.drop_field && !self.drop_alternative
    }

    /// Only removals, and at least one.
    pub fn is_downgrade(&self) -> bool {
        (self.drop_field || self.drop_alternative) && !self.add_field && !self.add_alternative
    }

    /// Whether every difference is one of those set in `allowed`.
    pub fn within(&self, allowed: CompatibilityResult) -> bool {
        (!self.add_field || allowed.add_field)
            && (!self.drop_field || allowed.drop_field)
            && (!self.add_alternative || allowed.add_alternative)
            && (!self.drop_alternative || allowed.drop_alternative)
    }

    pub fn union(self, other: CompatibilityResult) -> CompatibilityResult {
        CompatibilityResult {
            add_field: self.add_field || other.add_field,
            drop_field: self.drop_field || other.drop_field,
            add_alternative: self.add_alternative || other.add_alternative,
            drop_alternative: self.drop_alternative || other.drop_alternative,
        }
    }
}

/// Compares types of two schemas, accumulating differences across calls.
///
/// ```
/// use fracpack::{CustomTypes, Schema, SchemaDef, SchemaMatcher, TypeDef};
///
/// let old = SchemaDef::new().with("t", TypeDef::object([("a", TypeDef::i32())]));
/// let new = SchemaDef::new().with(
///     "t",
///     TypeDef::object([("a", TypeDef::i32()), ("b", TypeDef::option(TypeDef::i32()))]),
/// );
/// let old = Schema::load(&old, &CustomTypes::new()).unwrap();
/// let new = Schema::load(&new, &CustomTypes::new()).unwrap();
///
/// let mut matcher = SchemaMatcher::new(&old, &new);
/// assert!(matcher.match_types(old.type_id("t").unwrap(), new.type_id("t").unwrap()));
/// assert!(matcher.result().add_field);
/// ```
#[derive(Debug)]
pub struct SchemaMatcher<'a> {
    lhs: &'a Schema,
    rhs: &'a Schema,
    lhs_stack: HashMap<TypeId, usize>,
    rhs_stack: HashMap<TypeId, usize>,
    known: HashSet<(TypeId, TypeId)>,
    result: CompatibilityResult,
}

impl<'a> SchemaMatcher<'a> {
    pub fn new(lhs: &'a Schema, rhs: &'a Schema) -> Self {
        SchemaMatcher {
            lhs,
            rhs,
            lhs_stack: HashMap::new(),
            rhs_stack: HashMap::new(),
            known: HashSet::new(),
            result: CompatibilityResult::EQUIVALENT,
        }
    }

    /// Differences recorded so far. Meaningless once a match has failed.
    pub fn result(&self) -> CompatibilityResult {
        self.result
    }

    /// Whether `l` (in the left schema) can read data written as `r` (in
    /// the right schema).
    pub fn match_types(&mut self, l: TypeId, r: TypeId) -> bool {
        let l = self.lhs.structural(l);
        let r = self.rhs.structural(r);
        match (self.lhs_stack.get(&l), self.rhs_stack.get(&r)) {
            (Some(a), Some(b)) => {
                if a != b {
                    trace!("cycle depth mismatch: {l} entered at {a}, {r} at {b}");
                }
                return a == b;
            }
            (None, None) => {}
            _ => {
                trace!("only one of {l} and {r} closes a cycle");
                return false;
            }
        }
        if self.known.contains(&(l, r)) {
            return true;
        }
        let depth = self.lhs_stack.len();
        self.lhs_stack.insert(l, depth);
        self.rhs_stack.insert(r, depth);
        let matched = self.match_kinds(l, r);
        self.lhs_stack.remove(&l);
        self.rhs_stack.remove(&r);
        if matched {
            self.known.insert((l, r));
        }
        matched
    }

    fn match_kinds(&mut self, l: TypeId, r: TypeId) -> bool {
        let (lhs, rhs) = (self.lhs, self.rhs);
        match (lhs.descriptor(l), rhs.descriptor(r)) {
            (TypeDescriptor::Int { .. }, TypeDescriptor::Int { .. })
            | (TypeDescriptor::Float { .. }, TypeDescriptor::Float { .. }) => {
                let same = lhs.descriptor(l) == rhs.descriptor(r);
                if !same {
                    trace!(
                        "width mismatch: {:?} vs {:?}",
                        lhs.descriptor(l),
                        rhs.descriptor(r)
                    );
                }
                same
            }
            (TypeDescriptor::Struct { fields: a, .. }, TypeDescriptor::Struct { fields: b, .. }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.match_types(x.ty, y.ty))
            }
            (TypeDescriptor::Array { elem: a, len: n, .. }, TypeDescriptor::Array { elem: b, len: m, .. }) => {
                n == m && self.match_types(*a, *b)
            }
            (TypeDescriptor::List(a), TypeDescriptor::List(b))
            | (TypeDescriptor::Option(a), TypeDescriptor::Option(b))
            | (TypeDescriptor::FracPack(a), TypeDescriptor::FracPack(b)) => self.match_types(*a, *b),
            (TypeDescriptor::Variant(a), TypeDescriptor::Variant(b)) => {
                if !a.iter().zip(b).all(|(x, y)| self.match_types(x.ty, y.ty)) {
                    return false;
                }
                if a.len() < b.len() {
                    self.result.add_alternative = true;
                } else if a.len() > b.len() {
                    self.result.drop_alternative = true;
                }
                true
            }
            (TypeDescriptor::FracPack(_), TypeDescriptor::List(elem)) => {
                self.result.add_alternative = true;
                is_byte(rhs, *elem)
            }
            (TypeDescriptor::List(elem), TypeDescriptor::FracPack(_)) => {
                self.result.drop_alternative = true;
                is_byte(lhs, *elem)
            }
            (a, b) => match (members(a), members(b)) {
                (Some(a), Some(b)) => self.match_members(&a, &b),
                _ => {
                    trace!("kind mismatch: {} vs {}", a.kind_name(), b.kind_name());
                    false
                }
            },
        }
    }

    /// Object and Tuple members, compared by position. A surplus member on
    /// either side must be optional.
    fn match_members(&mut self, a: &[TypeId], b: &[TypeId]) -> bool {
        for (x, y) in a.iter().zip(b) {
            if !self.match_types(*x, *y) {
                return false;
            }
        }
        if let Some(extra) = a.get(b.len()..).filter(|s| !s.is_empty()) {
            if !extra.iter().all(|t| self.lhs.is_optional(*t)) {
                trace!("left side has a required surplus member");
                return false;
            }
            self.result.drop_field = true;
        }
        if let Some(extra) = b.get(a.len()..).filter(|s| !s.is_empty()) {
            if !extra.iter().all(|t| self.rhs.is_optional(*t)) {
                trace!("right side has a required surplus member");
                return false;
            }
            self.result.add_field = true;
        }
        true
    }
}

fn members(desc: &TypeDescriptor) -> Option<Vec<TypeId>> {
    match desc {
        TypeDescriptor::Object(fields) => Some(fields.iter().map(|f| f.ty).collect()),
        TypeDescriptor::Tuple(types) => Some(types.clone()),
        _ => None,
    }
}

fn is_byte(schema: &Schema, elem: TypeId) -> bool {
    matches!(
        schema.descriptor(schema.structural(elem)),
        TypeDescriptor::Int { bits: 8, .. }
    )
}

/// Compares one pair of types. `None` means incompatible.
pub fn compatibility(lhs: &Schema, l: TypeId, rhs: &Schema, r: TypeId) -> Option<CompatibilityResult> {
    match_schemas(lhs, rhs, [(l, r)])
}

/// Compares several pairs with a shared matcher and merges their
/// differences. `None` if any pair is incompatible.
pub fn match_schemas(
    lhs: &Schema,
    rhs: &Schema,
    pairs: impl IntoIterator<Item = (TypeId, TypeId)>,
) -> Option<CompatibilityResult> {
    let mut matcher = SchemaMatcher::new(lhs, rhs);
    for (l, r) in pairs {
        if !matcher.match_types(l, r) {
            return None;
        }
    }
    Some(matcher.result())
}
