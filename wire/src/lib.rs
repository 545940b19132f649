//! Wire framing for the zonal protocol.
//!
//! This crate handles the binary wire format: datagram control tags, the
//! per-message header, the message id partition and limit enforcement. It
//! does not know about parameter types or connections, only the structure of
//! datagrams.
//!
//! # Design Principles
//!
//! - **One control byte** - Every datagram starts with a [`ControlTag`].
//! - **Bounded decoding** - Sizes are validated against [`Limits`] before use.
//! - **No domain knowledge** - This crate handles framing, not dispatch.

mod error;
mod header;
mod limits;
mod packet;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use header::{MessageHeader, MessageId, ObjectId, COMMAND_BASE};
pub use limits::Limits;
pub use packet::{decode_datagram, encode_datagram, ControlTag, Datagram};
