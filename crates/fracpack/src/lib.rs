//! Schema-driven fracpack binary codec.
//!
//! A [`SchemaDef`] describes named types (ints, floats, structs, extensible
//! objects and tuples, arrays, lists, options, variants, nested fracpack
//! payloads and custom hooks). [`Schema::load`] resolves it into an arena of
//! [`TypeDescriptor`]s, a [`Codec`] packs and unpacks dynamic [`Value`]s
//! against it, and [`compatibility`] classifies how two schemas differ.
//!
//! ```
//! use fracpack::{standard_types, Schema, SchemaDef, TypeDef, Value};
//!
//! let def = SchemaDef::new().with(
//!     "point",
//!     TypeDef::object([("i", TypeDef::i32()), ("b", TypeDef::bool())]),
//! );
//! let schema = Schema::load(&def, &standard_types()).unwrap();
//!
//! let value = Value::object([("i", Value::Integer(6)), ("b", Value::Bool(true))]);
//! let bytes = schema.pack("point", &value).unwrap();
//! assert_eq!(bytes, [0x05, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01]);
//! assert_eq!(schema.unpack("point", &bytes).unwrap(), value);
//! ```

mod codec;
mod compat;
mod custom;
mod error;
mod options;
mod schema;
mod to_type_def;
mod types;
mod value;

pub use codec::{Codec, Deferred};
pub use compat::{compatibility, match_schemas, CompatibilityResult, SchemaMatcher};
pub use custom::{
    standard_types, BoolHandler, CustomHandler, CustomTypes, HexHandler, MapHandler, StringHandler,
};
pub use error::{FracpackError, Result, SchemaError};
pub use options::CodecOptions;
pub use schema::{Schema, SchemaDef, TypeDef};
pub use to_type_def::ToTypeDef;
pub use types::{Field, Layout, TypeDescriptor, TypeId};
pub use value::Value;

pub use fracpack_buffers::{BufferError, InputStream, OutputStream};
