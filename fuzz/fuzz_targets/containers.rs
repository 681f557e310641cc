#![no_main]

use libfuzzer_sys::fuzz_target;
use rdb_types::{intset, listpack, stream, ziplist, zipmap, StreamId};

// Fuzz target: compact container blobs.
//
// Every parser must reject malformed blobs with an error rather than
// panic or read out of bounds.
fuzz_target!(|data: &[u8]| {
    let _ = ziplist::unpack(data);
    let _ = listpack::unpack(data);
    let _ = intset::unpack(data);
    let _ = zipmap::unpack(data);
    let _ = stream::decode_listpack_entries(StreamId::new(0, 0), data);
    if let Ok(values) = listpack::unpack(data) {
        for value in values {
            let _ = value.as_score();
        }
    }
});
