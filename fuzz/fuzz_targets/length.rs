#![no_main]

use libfuzzer_sys::fuzz_target;
use rdb_wire::ByteCursor;

// Fuzz target: consecutive length prefixes.
//
// Catches bugs in:
// - 6/14/32/64-bit length forms
// - Special-encoding tags and reserved patterns
// - Offsets reported for truncated prefixes
fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);
    while cursor.read_tagged_length().is_ok() {}
    assert!(cursor.position() <= data.len() as u64);
});
