#![no_main]

use codec::{decode_message, encode_message, CodecLimits, Quat, TypeRegistry, Value, Vec3};
use libfuzzer_sys::fuzz_target;
use wire::{decode_datagram, Datagram, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::for_testing();
    let codec_limits = CodecLimits::for_testing();
    let types = TypeRegistry::new();

    let Ok(Datagram::Message { body }) = decode_datagram(data, &limits) else {
        return;
    };
    let Ok(message) = decode_message(body, &types, &codec_limits) else {
        return;
    };

    // Anything that decodes must re-encode to an equal message.
    let bytes = encode_message(&message, &types).expect("decoded message re-encodes");
    let again = decode_message(&bytes, &types, &codec_limits).expect("re-encoded message decodes");
    let comparable = message.params.iter().all(|value| match value {
        Value::F32(value) => !value.is_nan(),
        Value::F64(value) => !value.is_nan(),
        Value::Vec3(Vec3 { x, y, z }) => !(x.is_nan() || y.is_nan() || z.is_nan()),
        Value::Quat(Quat { x, y, z, w }) => ![x, y, z, w].iter().any(|c| c.is_nan()),
        _ => true,
    });
    if comparable {
        assert_eq!(again, message);
    }
});
