//! Round-trip coverage for every parameter type, including custom types.

use bitstream::{BitReader, BitResult, BitWriter};
use codec::{
    decode_message, encode_message, CodecLimits, CustomType, Message, MessageHeader, MessageId,
    ObjectId, Quat, TypeRegistry, Value, Vec3,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Loadout {
    slots: Vec<u8>,
    primary: bool,
}

impl CustomType for Loadout {
    const NAME: &'static str = "Loadout";

    fn encode(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bool(self.primary);
        writer.write_bytes(&self.slots)
    }

    fn decode(reader: &mut BitReader<'_>) -> BitResult<Self> {
        let primary = reader.read_bool()?;
        let slots = reader.read_bytes(16)?;
        Ok(Self { slots, primary })
    }
}

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register::<Loadout>().unwrap();
    types
}

fn finite_f32() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<u8>().prop_map(Value::U8),
        any::<u16>().prop_map(Value::U16),
        any::<u32>().prop_map(Value::U32),
        any::<u64>().prop_map(Value::U64),
        any::<i32>().prop_map(Value::I32),
        any::<i64>().prop_map(Value::I64),
        finite_f32().prop_map(Value::F32),
        (-1.0e12f64..1.0e12f64).prop_map(Value::F64),
        "[a-zA-Z0-9 ]{0,32}".prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        (finite_f32(), finite_f32(), finite_f32())
            .prop_map(|(x, y, z)| Value::Vec3(Vec3::new(x, y, z))),
        (finite_f32(), finite_f32(), finite_f32(), finite_f32())
            .prop_map(|(x, y, z, w)| Value::Quat(Quat::new(x, y, z, w))),
    ]
}

#[test]
fn every_type_roundtrips() {
    let types = registry();
    let loadout = Loadout {
        slots: vec![3, 1, 4],
        primary: true,
    };
    let params = vec![
        Value::Bool(false),
        Value::U8(u8::MAX),
        Value::U16(513),
        Value::U32(70_000),
        Value::U64(u64::MAX - 1),
        Value::I32(i32::MIN),
        Value::I64(-5),
        Value::F32(0.25),
        Value::F64(-1e100),
        Value::String("zone handoff".into()),
        Value::Bytes(vec![0, 255, 7]),
        Value::Vec3(Vec3::new(10.0, -2.0, 0.5)),
        Value::Quat(Quat::new(0.0, 0.707, 0.0, 0.707)),
        types.pack(&loadout).unwrap(),
    ];
    let message = Message::new(
        MessageHeader {
            id: MessageId::new(42),
            object: ObjectId::new(9),
            sequence: None,
        },
        params,
    );

    let bytes = encode_message(&message, &types).unwrap();
    let decoded = decode_message(&bytes, &types, &CodecLimits::default()).unwrap();
    assert_eq!(decoded, message);

    let custom = decoded.params.last().unwrap().as_custom().unwrap();
    assert_eq!(types.unpack::<Loadout>(custom).unwrap(), loadout);
}

#[test]
fn corrupt_custom_payload_is_rejected() {
    let types = registry();
    let mut value = types
        .pack(&Loadout {
            slots: vec![1, 2],
            primary: false,
        })
        .unwrap();
    if let Value::Custom(custom) = &mut value {
        custom.bytes.truncate(1);
    }
    let message = Message::new(MessageHeader::new(MessageId::new(1)), vec![value]);
    let bytes = encode_message(&message, &types).unwrap();
    assert!(decode_message(&bytes, &types, &CodecLimits::default()).is_err());
}

proptest! {
    #[test]
    fn arbitrary_messages_roundtrip(
        id in 1u16..0xFF00,
        object in any::<u32>(),
        sequence in proptest::option::of(any::<u32>()),
        params in proptest::collection::vec(value_strategy(), 0..12),
    ) {
        let types = registry();
        let message = Message::new(
            MessageHeader { id: MessageId::new(id), object: ObjectId::new(object), sequence },
            params,
        );
        let bytes = encode_message(&message, &types).unwrap();
        let decoded = decode_message(&bytes, &types, &CodecLimits::default()).unwrap();
        prop_assert_eq!(decoded, message);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..128)) {
        let types = registry();
        let _ = decode_message(&data, &types, &CodecLimits::for_testing());
    }
}
