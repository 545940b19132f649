use bitstream::{BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    Bits { bits: u8, value: u64 },
    Align,
    U16(u16),
    U64(u64),
    I32(i32),
    F64(f64),
    VarU64(u64),
    Str(String),
    Bytes(Vec<u8>),
}

fn mask_value(bits: u8, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        let mask = (1u64 << bits) - 1;
        value & mask
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u8..=64, any::<u64>()).prop_map(|(bits, value)| Op::Bits {
            bits,
            value: mask_value(bits, value),
        }),
        Just(Op::Align),
        any::<u16>().prop_map(Op::U16),
        any::<u64>().prop_map(Op::U64),
        any::<i32>().prop_map(Op::I32),
        any::<f64>()
            .prop_filter("nan", |v| !v.is_nan())
            .prop_map(Op::F64),
        any::<u64>().prop_map(Op::VarU64),
        ".{0,24}".prop_map(Op::Str),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Op::Bytes),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = BitWriter::new();

        for op in &ops {
            match op {
                Op::Bit(b) => writer.write_bool(*b),
                Op::Bits { bits, value } => writer.write_bits(*value, *bits).unwrap(),
                Op::Align => writer.align_to_byte(),
                Op::U16(v) => writer.write_u16(*v),
                Op::U64(v) => writer.write_u64(*v),
                Op::I32(v) => writer.write_i32(*v),
                Op::F64(v) => writer.write_f64(*v),
                Op::VarU64(v) => writer.write_varu64(*v),
                Op::Str(s) => writer.write_str(s).unwrap(),
                Op::Bytes(b) => writer.write_bytes(b).unwrap(),
            }
        }

        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        for op in &ops {
            match op {
                Op::Bit(b) => prop_assert_eq!(reader.read_bool().unwrap(), *b),
                Op::Bits { bits, value } => {
                    prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value);
                }
                Op::Align => reader.align_to_byte().unwrap(),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::U64(v) => prop_assert_eq!(reader.read_u64().unwrap(), *v),
                Op::I32(v) => prop_assert_eq!(reader.read_i32().unwrap(), *v),
                Op::F64(v) => prop_assert_eq!(reader.read_f64().unwrap(), *v),
                Op::VarU64(v) => prop_assert_eq!(reader.read_varu64().unwrap(), *v),
                Op::Str(s) => prop_assert_eq!(&reader.read_string(1024).unwrap(), s),
                Op::Bytes(b) => prop_assert_eq!(&reader.read_bytes(1024).unwrap(), b),
            }
        }
    }

    #[test]
    fn prop_reader_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut reader = BitReader::new(&bytes);
        let _ = reader.read_varu64();
        let _ = reader.read_string(32);
        let _ = reader.read_bits(13);
        let _ = reader.align_to_byte();
        let _ = reader.read_f32();
    }
}
