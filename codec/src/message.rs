//! Message encoding and decoding.
//!
//! Layout after the [`MessageHeader`]: varint parameter count, then per
//! parameter a 4-bit type code, an 8-bit custom type id for custom values,
//! and the value itself. The body is zero-padded to a byte boundary.

use bitstream::{BitReader, BitWriter};
use wire::MessageHeader;

use crate::custom::{CustomTypeId, TypeRegistry};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::types::{CustomValue, Quat, TypeTag, Value, Vec3, TAG_BITS};

/// A framed message: header plus wire parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: MessageHeader,
    pub params: Vec<Value>,
}

impl Message {
    #[must_use]
    pub fn new(header: MessageHeader, params: Vec<Value>) -> Self {
        Self { header, params }
    }
}

/// Encodes a message body (everything after the datagram control tag).
pub fn encode_message(message: &Message, types: &TypeRegistry) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(16);
    message.header.write(&mut writer)?;
    let count = u32::try_from(message.params.len()).map_err(|_| CodecError::LimitsExceeded {
        kind: LimitKind::Params,
        limit: u32::MAX as usize,
        actual: message.params.len(),
    })?;
    writer.write_varu32(count);
    for value in &message.params {
        write_value(&mut writer, value, types)?;
    }
    Ok(writer.finish())
}

/// Decodes a message body, validating every custom value against `types`.
pub fn decode_message(
    body: &[u8],
    types: &TypeRegistry,
    limits: &CodecLimits,
) -> CodecResult<Message> {
    let mut reader = BitReader::new(body);
    let header = MessageHeader::read(&mut reader)?;
    let count = reader.read_varu32()? as usize;
    if count > limits.max_params {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Params,
            limit: limits.max_params,
            actual: count,
        });
    }
    let mut params = Vec::with_capacity(count);
    for _ in 0..count {
        params.push(read_value(&mut reader, types, limits)?);
    }
    let remaining_bits = reader.bits_remaining();
    if remaining_bits >= 8 {
        return Err(CodecError::TrailingData { remaining_bits });
    }
    Ok(Message { header, params })
}

fn write_value(writer: &mut BitWriter, value: &Value, types: &TypeRegistry) -> CodecResult<()> {
    let code = value.tag().code().ok_or(CodecError::LocalOnlyValue)?;
    writer.write_bits(u64::from(code), TAG_BITS)?;
    match value {
        Value::Bool(v) => writer.write_bool(*v),
        Value::U8(v) => writer.write_u8(*v),
        Value::U16(v) => writer.write_u16(*v),
        Value::U32(v) => writer.write_u32(*v),
        Value::U64(v) => writer.write_u64(*v),
        Value::I32(v) => writer.write_i32(*v),
        Value::I64(v) => writer.write_i64(*v),
        Value::F32(v) => writer.write_f32(*v),
        Value::F64(v) => writer.write_f64(*v),
        Value::String(v) => writer.write_str(v)?,
        Value::Bytes(v) => writer.write_bytes(v)?,
        Value::Vec3(v) => {
            writer.write_f32(v.x);
            writer.write_f32(v.y);
            writer.write_f32(v.z);
        }
        Value::Quat(v) => {
            writer.write_f32(v.x);
            writer.write_f32(v.y);
            writer.write_f32(v.z);
            writer.write_f32(v.w);
        }
        Value::Custom(custom) => {
            if !types.contains(custom.type_id) {
                return Err(CodecError::UnknownCustomType { id: custom.type_id });
            }
            writer.write_u8(custom.type_id.raw());
            writer.write_bytes(&custom.bytes)?;
        }
        Value::Connection(_) => return Err(CodecError::LocalOnlyValue),
    }
    Ok(())
}

fn read_value(
    reader: &mut BitReader<'_>,
    types: &TypeRegistry,
    limits: &CodecLimits,
) -> CodecResult<Value> {
    let code = reader.read_bits(TAG_BITS)? as u8;
    let value = match code {
        0 => Value::Bool(reader.read_bool()?),
        1 => Value::U8(reader.read_u8()?),
        2 => Value::U16(reader.read_u16()?),
        3 => Value::U32(reader.read_u32()?),
        4 => Value::U64(reader.read_u64()?),
        5 => Value::I32(reader.read_i32()?),
        6 => Value::I64(reader.read_i64()?),
        7 => Value::F32(reader.read_f32()?),
        8 => Value::F64(reader.read_f64()?),
        9 => Value::String(read_limited(
            reader,
            LimitKind::StringBytes,
            limits.max_string_bytes,
            BitReader::read_string,
        )?),
        10 => Value::Bytes(read_limited(
            reader,
            LimitKind::ByteArrayBytes,
            limits.max_byte_array_bytes,
            BitReader::read_bytes,
        )?),
        11 => Value::Vec3(Vec3::new(
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
        )),
        12 => Value::Quat(Quat::new(
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
        )),
        13 => {
            let type_id = CustomTypeId::new(reader.read_u8()?);
            if !types.contains(type_id) {
                return Err(CodecError::UnknownCustomType { id: type_id });
            }
            let bytes = read_limited(
                reader,
                LimitKind::CustomBytes,
                limits.max_custom_bytes,
                BitReader::read_bytes,
            )?;
            types.validate(type_id, &bytes)?;
            Value::Custom(CustomValue { type_id, bytes })
        }
        tag => return Err(CodecError::UnknownTypeTag { tag }),
    };
    Ok(value)
}

/// Runs a length-prefixed read, reporting the limit as a codec error.
fn read_limited<'a, T>(
    reader: &mut BitReader<'a>,
    kind: LimitKind,
    limit: usize,
    read: impl FnOnce(&mut BitReader<'a>, usize) -> bitstream::BitResult<T>,
) -> CodecResult<T> {
    read(reader, limit).map_err(|err| match err {
        bitstream::BitError::LengthLimit { length, limit } => CodecError::LimitsExceeded {
            kind,
            limit,
            actual: length,
        },
        other => CodecError::Bitstream(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::{MessageId, ObjectId};

    fn header(id: u16) -> MessageHeader {
        MessageHeader::new(MessageId::new(id))
    }

    #[test]
    fn empty_message_roundtrip() {
        let types = TypeRegistry::new();
        let message = Message::new(header(1), vec![]);
        let bytes = encode_message(&message, &types).unwrap();
        let decoded = decode_message(&bytes, &types, &CodecLimits::default()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn mixed_params_roundtrip() {
        let types = TypeRegistry::new();
        let message = Message::new(
            MessageHeader {
                id: MessageId::new(12),
                object: ObjectId::new(500),
                sequence: Some(3),
            },
            vec![
                Value::Bool(true),
                Value::I32(-12),
                Value::String("spawn".into()),
                Value::Vec3(Vec3::new(1.0, 2.5, -3.0)),
                Value::Quat(Quat::IDENTITY),
            ],
        );
        let bytes = encode_message(&message, &types).unwrap();
        let decoded = decode_message(&bytes, &types, &CodecLimits::default()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn connection_values_are_not_encodable() {
        let types = TypeRegistry::new();
        let addr = "127.0.0.1:1".parse().unwrap();
        let message = Message::new(header(1), vec![Value::Connection(addr)]);
        assert_eq!(
            encode_message(&message, &types).unwrap_err(),
            CodecError::LocalOnlyValue
        );
    }

    #[test]
    fn truncated_body_is_rejected() {
        let types = TypeRegistry::new();
        let message = Message::new(header(4), vec![Value::U64(u64::MAX)]);
        let bytes = encode_message(&message, &types).unwrap();
        let err = decode_message(&bytes[..bytes.len() - 2], &types, &CodecLimits::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::Bitstream(_)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let types = TypeRegistry::new();
        let message = Message::new(header(4), vec![Value::U8(1)]);
        let mut bytes = encode_message(&message, &types).unwrap();
        bytes.push(0);
        let err = decode_message(&bytes, &types, &CodecLimits::default()).unwrap_err();
        assert!(matches!(err, CodecError::TrailingData { .. }));
    }

    #[test]
    fn param_count_limit() {
        let types = TypeRegistry::new();
        let limits = CodecLimits::for_testing();
        let params = vec![Value::Bool(false); limits.max_params + 1];
        let bytes = encode_message(&Message::new(header(2), params), &types).unwrap();
        let err = decode_message(&bytes, &types, &limits).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::Params,
                ..
            }
        ));
    }

    #[test]
    fn string_limit_reports_codec_limit() {
        let types = TypeRegistry::new();
        let limits = CodecLimits::for_testing();
        let long = "x".repeat(limits.max_string_bytes + 1);
        let bytes =
            encode_message(&Message::new(header(2), vec![Value::String(long)]), &types).unwrap();
        let err = decode_message(&bytes, &types, &limits).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                ..
            }
        ));
    }

    #[test]
    fn unknown_custom_type_rejected_on_decode() {
        let mut writer = BitWriter::new();
        header(3).write(&mut writer).unwrap();
        writer.write_varu32(1);
        writer.write_bits(13, TAG_BITS).unwrap();
        writer.write_u8(5);
        writer.write_bytes(&[]).unwrap();
        let bytes = writer.finish();
        let err = decode_message(&bytes, &TypeRegistry::new(), &CodecLimits::default())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownCustomType {
                id: CustomTypeId::new(5)
            }
        );
    }

    #[test]
    fn unknown_type_code_rejected() {
        let mut writer = BitWriter::new();
        header(3).write(&mut writer).unwrap();
        writer.write_varu32(1);
        writer.write_bits(15, TAG_BITS).unwrap();
        let bytes = writer.finish();
        let err = decode_message(&bytes, &TypeRegistry::new(), &CodecLimits::default())
            .unwrap_err();
        assert_eq!(err, CodecError::UnknownTypeTag { tag: 15 });
    }
}
