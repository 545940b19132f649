#![no_main]

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Input bytes pick a bounded sequence of reads.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bool();
            }
            1 => {
                let bits = data[idx.saturating_sub(1)] % 65;
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.align_to_byte();
            }
            3 => {
                let _ = reader.read_varu32();
            }
            4 => {
                let _ = reader.read_varu64();
            }
            5 => {
                let _ = reader.read_bytes(64);
            }
            _ => {
                let _ = reader.read_string(64);
            }
        }
    }
});
