use criterion::{black_box, criterion_group, criterion_main, Criterion};

use codec::{
    decode_message, encode_message, CodecLimits, Message, MessageHeader, MessageId, ObjectId,
    TypeRegistry, Value, Vec3,
};

fn sync_message() -> Message {
    Message::new(
        MessageHeader {
            id: MessageId::new(17),
            object: ObjectId::new(1234),
            sequence: None,
        },
        vec![
            Value::U32(1234),
            Value::Vec3(Vec3::new(12.5, 0.0, -40.25)),
            Value::Bytes(vec![0xAB; 24]),
        ],
    )
}

fn bench_encode(c: &mut Criterion) {
    let types = TypeRegistry::new();
    let message = sync_message();
    c.bench_function("encode_sync_message", |b| {
        b.iter(|| encode_message(black_box(&message), &types))
    });
}

fn bench_decode(c: &mut Criterion) {
    let types = TypeRegistry::new();
    let limits = CodecLimits::default();
    let bytes = encode_message(&sync_message(), &types).expect("encode");
    c.bench_function("decode_sync_message", |b| {
        b.iter(|| decode_message(black_box(&bytes), &types, &limits))
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
