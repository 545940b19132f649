//! Typed message parameters and message encoding for zonal.
//!
//! This crate sits on top of `bitstream` and `wire`. It defines the parameter
//! [`Value`] model, [`Signature`]s for methods and commands, application
//! [`CustomType`]s registered per node in a [`TypeRegistry`], and the
//! encode/decode functions for a full [`Message`].
//!
//! # Design Principles
//!
//! - **Self-describing parameters** - Each value carries a 4-bit type code so
//!   malformed payloads are caught before dispatch.
//! - **Local-only slots** - [`TypeTag::Connection`] parameters are filled in by
//!   the receiver and never encoded.
//! - **Bounded decoding** - All lengths are capped by [`CodecLimits`].

mod custom;
mod error;
mod limits;
mod message;
mod signature;
mod types;

pub use custom::{CustomType, CustomTypeId, TypeRegistry};
pub use error::{CodecError, CodecResult, LimitKind};
pub use limits::CodecLimits;
pub use message::{decode_message, encode_message, Message};
pub use signature::Signature;
pub use types::{CustomValue, Quat, TypeTag, Value, Vec3};
pub use wire::{MessageHeader, MessageId, ObjectId};
