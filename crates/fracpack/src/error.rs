//! Codec and schema error types.

use fracpack_buffers::BufferError;
use thiserror::Error;

/// Errors raised while loading a schema description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{0}` is defined in terms of itself")]
    SelfDependency(String),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unsupported integer width: {0} bits")]
    UnsupportedIntBits(u32),
    #[error("type `{0}` is too large")]
    TooLarge(String),
    #[error("type `{0}` not found")]
    NotFound(String),
    #[error("type #{0} was never resolved")]
    Unresolved(u32),
}

/// Errors raised by a single pack or unpack call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FracpackError {
    #[error("read past end of buffer")]
    OutOfBounds,
    #[error("bad offset")]
    BadOffset,
    #[error("bad size")]
    BadSize,
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("unknown variant alternative {0}")]
    UnknownAlternative(u8),
    #[error("last optional field must not be empty")]
    LastOptionalMustNotBeEmpty,
    #[error("integer out of range for {bits}-bit {} type", signedness(.signed))]
    IntegerOutOfRange { bits: u32, signed: bool },
    #[error("non-empty offset points at an empty container")]
    BadEmptyEncoding,
    #[error("invalid UTF-8 in string")]
    BadUtf8,
    #[error("extra data in buffer")]
    ExtraData,
    #[error("unknown field in object")]
    UnknownField,
    #[error("nesting depth limit exceeded")]
    DepthLimitExceeded,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown variant alternative `{0}`")]
    UnknownAlternativeName(String),
    #[error("unsupported float layout: {exp} exponent bits, {mantissa} mantissa bits")]
    UnsupportedFloat { exp: u32, mantissa: u32 },
    #[error("invalid hex string")]
    BadHex,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn signedness(signed: &bool) -> &'static str {
    if *signed {
        "signed"
    } else {
        "unsigned"
    }
}

impl From<BufferError> for FracpackError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::OutOfBounds => FracpackError::OutOfBounds,
            BufferError::BadOffset => FracpackError::BadOffset,
        }
    }
}

pub type Result<T> = std::result::Result<T, FracpackError>;
