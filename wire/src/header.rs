//! Message identifiers and the per-message header.

use std::fmt;

use bitstream::{BitReader, BitResult, BitWriter};

/// First id of the reserved control-command range.
///
/// Ids at or above this value are internal commands, ids below it (except 0)
/// are negotiated RPC ids.
pub const COMMAND_BASE: u16 = 0xFF00;

/// A numeric message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MessageId(u16);

impl MessageId {
    /// The first assignable RPC id.
    pub const FIRST_RPC: Self = Self(1);

    /// Creates a message id.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` if this id lies in the reserved command range.
    #[must_use]
    pub const fn is_command(self) -> bool {
        self.0 >= COMMAND_BASE
    }

    /// Returns `true` if this id is a usable RPC id.
    #[must_use]
    pub const fn is_rpc(self) -> bool {
        self.0 != 0 && self.0 < COMMAND_BASE
    }

    /// Returns the next RPC id, or `None` once the RPC range is exhausted.
    #[must_use]
    pub const fn next_rpc(self) -> Option<Self> {
        let next = self.0.wrapping_add(1);
        if next == 0 || next >= COMMAND_BASE {
            None
        } else {
            Some(Self(next))
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A network object identifier. Zero means "no associated object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    /// The "no object" sentinel.
    pub const NONE: Self = Self(0);

    /// Creates an object id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the "no object" sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj:{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ObjectId> for u32 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Header preceding every message parameter list.
///
/// Layout (bit-packed): reliable flag, optional varint sequence, object flag,
/// 16-bit id, optional varint object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: MessageId,
    /// Target object; [`ObjectId::NONE`] when not object-scoped.
    pub object: ObjectId,
    /// Sequence number for reliable messages, `None` for fire-and-forget.
    pub sequence: Option<u32>,
}

impl MessageHeader {
    /// Creates an unreliable header without an object target.
    #[must_use]
    pub const fn new(id: MessageId) -> Self {
        Self {
            id,
            object: ObjectId::NONE,
            sequence: None,
        }
    }

    /// Writes the header.
    pub fn write(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bool(self.sequence.is_some());
        if let Some(sequence) = self.sequence {
            writer.write_varu32(sequence);
        }
        writer.write_bool(!self.object.is_none());
        writer.write_bits(u64::from(self.id.raw()), 16)?;
        if !self.object.is_none() {
            writer.write_varu32(self.object.raw());
        }
        Ok(())
    }

    /// Reads a header.
    pub fn read(reader: &mut BitReader<'_>) -> BitResult<Self> {
        let sequence = if reader.read_bool()? {
            Some(reader.read_varu32()?)
        } else {
            None
        };
        let has_object = reader.read_bool()?;
        let id = MessageId::new(reader.read_u16()?);
        let object = if has_object {
            ObjectId::new(reader.read_varu32()?)
        } else {
            ObjectId::NONE
        };
        Ok(Self {
            id,
            object,
            sequence,
        })
    }
}
