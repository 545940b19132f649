//! Engine-side hooks producing and consuming view payloads.

use bitstream::{BitReader, BitResult, BitWriter};
use codec::{ObjectId, Vec3};
use net::ObjectRecord;

use crate::relationship::Relationship;

/// Writes the engine state of local objects for remote views.
///
/// Each relationship has its own instantiation hook. The creator, owner and
/// peer hooks fall back to the proxy one.
pub trait ViewWriter {
    fn write_proxy(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()>;

    fn write_creator(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        self.write_proxy(record, out)
    }

    fn write_owner(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        self.write_proxy(record, out)
    }

    fn write_peer(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        self.write_proxy(record, out)
    }

    /// Periodic state for a view already instantiated.
    fn write_sync(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()>;
}

/// Applies view messages to the engine on the receiving side.
pub trait ViewReader {
    fn read_proxy(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()>;

    fn read_creator(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        self.read_proxy(object, position, data)
    }

    fn read_owner(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        self.read_proxy(object, position, data)
    }

    fn read_peer(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        self.read_proxy(object, position, data)
    }

    fn sync(&mut self, object: ObjectId, position: Vec3, data: &mut BitReader<'_>)
        -> BitResult<()>;

    fn destroy(&mut self, object: ObjectId);
}

pub(crate) fn write_instantiate<W: ViewWriter + ?Sized>(
    writer: &mut W,
    relationship: Relationship,
    record: &ObjectRecord,
) -> BitResult<Vec<u8>> {
    let mut out = BitWriter::new();
    match relationship {
        Relationship::Creator => writer.write_creator(record, &mut out)?,
        Relationship::Owner => writer.write_owner(record, &mut out)?,
        Relationship::Peer => writer.write_peer(record, &mut out)?,
        Relationship::Proxy => writer.write_proxy(record, &mut out)?,
    }
    Ok(out.finish())
}

pub(crate) fn write_sync<W: ViewWriter + ?Sized>(
    writer: &mut W,
    record: &ObjectRecord,
) -> BitResult<Vec<u8>> {
    let mut out = BitWriter::new();
    writer.write_sync(record, &mut out)?;
    Ok(out.finish())
}

pub(crate) fn read_instantiate<R: ViewReader + ?Sized>(
    reader: &mut R,
    relationship: Relationship,
    object: ObjectId,
    position: Vec3,
    data: &[u8],
) -> BitResult<()> {
    let mut data = BitReader::new(data);
    match relationship {
        Relationship::Creator => reader.read_creator(object, position, &mut data),
        Relationship::Owner => reader.read_owner(object, position, &mut data),
        Relationship::Peer => reader.read_peer(object, position, &mut data),
        Relationship::Proxy => reader.read_proxy(object, position, &mut data),
    }
}
