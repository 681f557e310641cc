#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: full decoder over arbitrary bytes.
//
// Catches bugs in:
// - Header validation (magic, version digits, version bounds)
// - Opcode dispatch and metadata scoping
// - Length prefixes, inline integers and LZF strings
// - Every supported value type, including compact containers
// - Trailer and checksum handling
fuzz_target!(|data: &[u8]| {
    let _ = rdb_decoder::RdbDecoder::new().decode(data);
});
