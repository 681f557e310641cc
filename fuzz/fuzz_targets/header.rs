#![no_main]

use libfuzzer_sys::fuzz_target;
use rdb_wire::header::{MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION, RdbHeader};
use rdb_wire::ByteCursor;

// Fuzz target: RdbHeader::read_from with arbitrary bytes.
//
// Catches bugs in:
// - Magic validation
// - Version digit parsing
// - Truncated header handling
fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);
    let _ = RdbHeader::read_from(&mut cursor, MIN_SUPPORTED_VERSION, MAX_SUPPORTED_VERSION);
});
