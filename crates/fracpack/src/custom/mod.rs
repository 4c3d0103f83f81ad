//! Custom type hooks.
//!
//! A `Custom{type, id}` entry in a schema names a hook that packs and
//! unpacks a richer value than its representation would on its own (e.g. a
//! `List(u8)` read as a string). The wire layout is always that of the
//! representation.

mod standard;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fracpack_buffers::{InputStream, OutputStream};

use crate::codec::Codec;
use crate::error::{FracpackError, Result};
use crate::schema::Schema;
use crate::types::TypeId;
use crate::value::Value;

pub use standard::{standard_types, BoolHandler, HexHandler, MapHandler, StringHandler};

/// Packs and unpacks values of one custom type.
///
/// `repr` is always the structural representation (aliases and nested hooks
/// already unwrapped).
pub trait CustomHandler: Send + Sync {
    /// Whether this hook can handle `repr`. Checked once at schema load
    /// time; a hook that does not match is dropped in favor of the plain
    /// representation.
    fn matches(&self, schema: &Schema, repr: TypeId) -> bool;

    /// Writes the top-level encoding of `value`.
    fn pack(
        &self,
        codec: &Codec<'_>,
        repr: TypeId,
        value: &Value,
        out: &mut OutputStream,
    ) -> Result<()>;

    /// Reads the top-level encoding of a value.
    fn unpack(&self, codec: &Codec<'_>, repr: TypeId, input: &mut InputStream<'_>)
        -> Result<Value>;

    /// Whether `value` is the canonical empty value. Only consulted when
    /// `repr` is a container.
    fn is_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId, _value: &Value) -> bool {
        false
    }

    /// The value an offset of 0 decodes to.
    fn new_empty_container(&self, _codec: &Codec<'_>, _repr: TypeId) -> Result<Value> {
        Err(FracpackError::BadOffset)
    }

    /// Converts JSON into a value this hook can pack.
    fn from_json(
        &self,
        codec: &Codec<'_>,
        repr: TypeId,
        json: &serde_json::Value,
    ) -> Result<Value> {
        codec.value_from_json(json, repr)
    }
}

/// Registry of hooks by id.
#[derive(Clone, Default)]
pub struct CustomTypes {
    handlers: HashMap<String, Arc<dyn CustomHandler>>,
}

impl CustomTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `id`, replacing any previous hook.
    pub fn insert(&mut self, id: impl Into<String>, handler: impl CustomHandler + 'static) {
        self.insert_arc(id, Arc::new(handler));
    }

    pub fn insert_arc(&mut self, id: impl Into<String>, handler: Arc<dyn CustomHandler>) {
        self.handlers.insert(id.into(), handler);
    }

    pub fn with(mut self, id: impl Into<String>, handler: impl CustomHandler + 'static) -> Self {
        self.insert(id, handler);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn CustomHandler>> {
        self.handlers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CustomTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("CustomTypes").field("ids", &ids).finish()
    }
}
