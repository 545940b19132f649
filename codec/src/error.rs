//! Error types for codec operations.

use std::fmt;

use crate::types::TypeTag;
use crate::CustomTypeId;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Bitstream error (truncation, bad varint, bad UTF-8).
    Bitstream(bitstream::BitError),

    /// Unknown parameter type tag on the wire.
    UnknownTypeTag { tag: u8 },

    /// Custom type id not present in the local registry.
    UnknownCustomType { id: CustomTypeId },

    /// Custom type was used before being registered.
    CustomTypeNotRegistered { name: &'static str },

    /// A custom type with this name is already registered.
    DuplicateCustomType { name: &'static str },

    /// The custom type id space is full.
    CustomTypeSpaceExhausted,

    /// A value that only exists locally (a connection handle) was sent.
    LocalOnlyValue,

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Parameter count does not match the expected signature.
    ParamCountMismatch { expected: usize, found: usize },

    /// Parameter type does not match the expected signature.
    TypeMismatch {
        index: usize,
        expected: TypeTag,
        found: TypeTag,
    },

    /// Message body had trailing data after the last parameter.
    TrailingData { remaining_bits: usize },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Params,
    StringBytes,
    ByteArrayBytes,
    CustomBytes,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitstream(e) => write!(f, "bitstream error: {e}"),
            Self::UnknownTypeTag { tag } => write!(f, "unknown type tag: {tag}"),
            Self::UnknownCustomType { id } => write!(f, "unknown custom type {id}"),
            Self::CustomTypeNotRegistered { name } => {
                write!(f, "custom type {name} is not registered")
            }
            Self::DuplicateCustomType { name } => {
                write!(f, "custom type {name} is already registered")
            }
            Self::CustomTypeSpaceExhausted => write!(f, "custom type id space exhausted"),
            Self::LocalOnlyValue => write!(f, "connection values cannot be sent"),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::ParamCountMismatch { expected, found } => {
                write!(f, "expected {expected} parameters, found {found}")
            }
            Self::TypeMismatch {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "parameter {index}: expected {expected}, found {found}"
                )
            }
            Self::TrailingData { remaining_bits } => {
                write!(f, "trailing data after parameters: {remaining_bits} bits")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Params => "parameter count",
            Self::StringBytes => "string bytes",
            Self::ByteArrayBytes => "byte array bytes",
            Self::CustomBytes => "custom value bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<bitstream::BitError> for CodecError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Bitstream(err)
    }
}
