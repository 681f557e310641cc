#![no_main]

use libfuzzer_sys::fuzz_target;
use rdb_decoder::{DecoderConfig, OpcodeTable, RdbDecoder};

// Fuzz target: object stream after a valid header.
//
// Prepends `REDIS0012` so the fuzzer spends its time past header
// validation. The first input byte picks the opcode table.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let opcodes = if selector & 1 == 0 {
        OpcodeTable::legacy_v12()
    } else {
        OpcodeTable::standard()
    };
    let decoder = RdbDecoder::with_config(DecoderConfig {
        opcodes,
        verify_checksum: false,
        ..DecoderConfig::default()
    });

    let mut dump = b"REDIS0012".to_vec();
    dump.extend_from_slice(body);
    for object in decoder.stream(&dump[..]) {
        if object.is_err() {
            break;
        }
    }
});
