//! Compact encodings through the full decoder.
//!
//! Every compact encoding must decode to the same payload as the plain
//! encoding of the same value. The `encoding` field is the only thing that
//! tells them apart.

use rdb_decoder::{DecodeError, ErrorKind, RdbDecoder};
use rdb_tests::DumpBuilder;
use rdb_tests::pack::{self, Packed};
use rdb_types::{ObjectKind, ObjectPayload, RedisObject, StreamId, ValueType};

fn single(build: impl FnOnce(&mut DumpBuilder)) -> RedisObject {
    let mut builder = DumpBuilder::new(12);
    builder.select_db(0);
    build(&mut builder);
    let mut objects = RdbDecoder::new()
        .decode(&builder.finish())
        .unwrap_or_else(|e| panic!("decode failed: {e}"))
        .objects;
    assert_eq!(objects.len(), 1);
    objects.remove(0)
}

fn decode_err(build: impl FnOnce(&mut DumpBuilder)) -> DecodeError {
    let mut builder = DumpBuilder::new(12);
    build(&mut builder);
    RdbDecoder::new()
        .decode(&builder.finish())
        .expect_err("decode should fail")
}

// ── Lists ─────────────────────────────────────────────────────────────────────

#[test]
fn list_encodings_agree() {
    let plain = single(|b| {
        b.list_object(b"l", &[b"a", b"12", b"-3"]);
    });

    let items = [Packed::Str(b"a"), Packed::Int(12), Packed::Int(-3)];
    let ziplist = single(|b| {
        b.object(10, b"l").string(&pack::ziplist(&items));
    });
    let quicklist = single(|b| {
        b.object(14, b"l")
            .length(2)
            .string(&pack::ziplist(&items[..1]))
            .string(&pack::ziplist(&items[1..]));
    });
    let quicklist2 = single(|b| {
        b.object(18, b"l")
            .length(2)
            .length(2)
            .string(&pack::listpack(&items[..2]))
            .length(1)
            .string(b"-3");
    });

    for compact in [&ziplist, &quicklist, &quicklist2] {
        assert_eq!(compact.payload, plain.payload, "{:?}", compact.encoding);
    }
    assert_eq!(quicklist2.encoding, ValueType::ListQuicklist2);
}

// ── Sets ──────────────────────────────────────────────────────────────────────

#[test]
fn set_encodings_agree() {
    let plain = single(|b| {
        b.object(2, b"s").length(3).string(b"1").string(b"2").string(b"300");
    });
    let intset = single(|b| {
        b.object(11, b"s").string(&pack::intset(&[300, 1, 2]));
    });
    let listpack = single(|b| {
        b.object(20, b"s").string(&pack::listpack(&[
            Packed::Int(1),
            Packed::Int(2),
            Packed::Int(300),
        ]));
    });

    assert_eq!(intset.payload, plain.payload);
    assert_eq!(listpack.payload, plain.payload);
    assert_eq!(intset.kind(), ObjectKind::Set);
}

// ── Sorted sets ───────────────────────────────────────────────────────────────

#[test]
fn sorted_set_encodings_agree() {
    let text = single(|b| {
        b.object(3, b"z")
            .length(2)
            .string(b"low")
            .double_string(1.0)
            .string(b"high")
            .double_string(2.5);
    });
    let binary = single(|b| {
        b.object(5, b"z")
            .length(2)
            .string(b"low")
            .binary_double(1.0)
            .string(b"high")
            .binary_double(2.5);
    });
    let members = [
        Packed::Str(b"low"),
        Packed::Int(1),
        Packed::Str(b"high"),
        Packed::Str(b"2.5"),
    ];
    let ziplist = single(|b| {
        b.object(12, b"z").string(&pack::ziplist(&members));
    });
    let listpack = single(|b| {
        b.object(17, b"z").string(&pack::listpack(&members));
    });

    for other in [&binary, &ziplist, &listpack] {
        assert_eq!(other.payload, text.payload, "{:?}", other.encoding);
    }
}

#[test]
fn unparseable_score_in_listpack() {
    let blob = pack::listpack(&[Packed::Str(b"m"), Packed::Str(b"not-a-number")]);
    let err = decode_err(|b| {
        b.object(17, b"z").string(&blob);
    });
    assert_eq!(err.kind(), ErrorKind::CorruptContainer);
    // The blob's length prefix follows the tag and the one-byte key.
    assert_eq!(err.offset(), Some(12));
}

// ── Hashes ────────────────────────────────────────────────────────────────────

#[test]
fn hash_encodings_agree() {
    let plain = single(|b| {
        b.hash_object(b"h", &[(b"name", b"ada"), (b"age", b"36")]);
    });
    let zipmap = single(|b| {
        b.object(9, b"h")
            .string(&pack::zipmap(&[(b"name", b"ada"), (b"age", b"36")]));
    });
    let pairs = [
        Packed::Str(b"name"),
        Packed::Str(b"ada"),
        Packed::Str(b"age"),
        Packed::Int(36),
    ];
    let ziplist = single(|b| {
        b.object(13, b"h").string(&pack::ziplist(&pairs));
    });
    let listpack = single(|b| {
        b.object(16, b"h").string(&pack::listpack(&pairs));
    });

    for compact in [&zipmap, &ziplist, &listpack] {
        assert_eq!(compact.payload, plain.payload, "{:?}", compact.encoding);
    }
}

#[test]
fn hash_field_ttls() {
    let metadata = single(|b| {
        b.object(24, b"h")
            .u64_le(2_000)
            .length(2)
            .length(0)
            .string(b"a")
            .string(b"1")
            .length(11)
            .string(b"b")
            .string(b"2");
    });
    let listpack_ex = single(|b| {
        b.object(25, b"h").u64_le(2_000).string(&pack::listpack(&[
            Packed::Str(b"a"),
            Packed::Str(b"1"),
            Packed::Int(0),
            Packed::Str(b"b"),
            Packed::Str(b"2"),
            Packed::Int(2_010),
        ]));
    });

    assert_eq!(metadata.payload, listpack_ex.payload);
    let ObjectPayload::Hash(entries) = metadata.payload else {
        panic!("expected hash");
    };
    assert_eq!(entries[0].expire_ms, None);
    assert_eq!(entries[1].expire_ms, Some(2_010));
}

#[test]
fn pre_release_ttl_hashes_are_rejected() {
    for tag in [22u8, 23] {
        let err = decode_err(|b| {
            b.object(tag, b"h").u64_le(0).length(0);
        });
        assert!(
            matches!(err, DecodeError::UnknownObjectType { offset: 9, type_tag } if type_tag == tag),
            "tag {tag}: {err:?}"
        );
    }
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// A node holding `1000-0 {temp: 20}` and `1000-1 {temp: 21}`.
fn stream_node() -> Vec<u8> {
    pack::listpack(&[
        // master entry: 2 live, 0 deleted, 1 field "temp", terminator
        Packed::Int(2),
        Packed::Int(0),
        Packed::Int(1),
        Packed::Str(b"temp"),
        Packed::Int(0),
        // 1000-0, same fields
        Packed::Int(2),
        Packed::Int(0),
        Packed::Int(0),
        Packed::Int(20),
        Packed::Int(4),
        // 1000-1, same fields
        Packed::Int(2),
        Packed::Int(0),
        Packed::Int(1),
        Packed::Int(21),
        Packed::Int(4),
    ])
}

#[test]
fn stream_v1_without_groups() {
    let object = single(|b| {
        b.object(15, b"sensor")
            .length(1)
            .string(&[1000u64.to_be_bytes(), 0u64.to_be_bytes()].concat())
            .string(&stream_node())
            // length, last id
            .length(2)
            .length(1000)
            .length(1)
            // groups
            .length(0);
    });

    let ObjectPayload::Stream(stream) = &object.payload else {
        panic!("expected stream");
    };
    assert_eq!(object.kind(), ObjectKind::Stream);
    assert_eq!(stream.length, 2);
    assert_eq!(stream.last_id, StreamId::new(1000, 1));
    assert_eq!(stream.first_id, None);
    let ids: Vec<_> = stream.entries.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, ["1000-0", "1000-1"]);
    assert_eq!(stream.entries[1].fields, vec![(b"temp".to_vec(), b"21".to_vec())]);
}

#[test]
fn stream_v2_group_without_active_time() {
    let object = single(|b| {
        b.object(19, b"sensor")
            .length(1)
            .string(&[1000u64.to_be_bytes(), 0u64.to_be_bytes()].concat())
            .string(&stream_node())
            .length(2)
            .length(1000)
            .length(1)
            // first id, max deleted id, entries added
            .length(1000)
            .length(0)
            .length(0)
            .length(0)
            .length(2)
            // one group with one pending entry and one consumer
            .length(1)
            .string(b"readers")
            .length(1000)
            .length(0)
            .length(1)
            .length(1)
            .stream_id(1000, 0)
            .u64_le(1_700_000_000_000)
            .length(1)
            .length(1)
            .string(b"bob")
            .u64_le(1_700_000_000_500)
            .length(1)
            .stream_id(1000, 0);
    });

    let ObjectPayload::Stream(stream) = &object.payload else {
        panic!("expected stream");
    };
    assert_eq!(stream.entries_added, Some(2));
    let group = &stream.groups[0];
    assert_eq!(group.entries_read, Some(1));
    assert_eq!(group.pending[0].id, StreamId::new(1000, 0));
    assert_eq!(group.consumers[0].name, b"bob");
    assert_eq!(group.consumers[0].active_time_ms, None);
}

#[test]
fn corrupt_stream_node_reports_blob_offset() {
    let mut node = stream_node();
    // Break the listpack terminator.
    let last = node.len() - 1;
    node[last] = 0x00;

    let err = decode_err(|b| {
        b.object(15, b"s")
            .length(1)
            .string(&[0u8; 16])
            .string(&node)
            .length(0)
            .length(0)
            .length(0)
            .length(0);
    });
    assert_eq!(err.kind(), ErrorKind::CorruptContainer);
    // tag(9) key(10..12) nodes(12) id(13..30) blob(30)
    assert_eq!(err.offset(), Some(30));
}

// ── Corrupt blobs ─────────────────────────────────────────────────────────────

#[test]
fn corrupt_blobs_fail_with_blob_offset() {
    let mut ziplist = pack::ziplist(&[Packed::Str(b"a")]);
    let end = ziplist.len() - 1;
    ziplist[end] = 0x00;

    let mut intset = pack::intset(&[1, 2, 3]);
    intset.pop();

    for (tag, blob) in [(10u8, ziplist), (11, intset)] {
        let err = decode_err(|b| {
            b.object(tag, b"k").string(&blob);
        });
        assert_eq!(err.kind(), ErrorKind::CorruptContainer, "tag {tag}");
        assert_eq!(err.offset(), Some(12), "tag {tag}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
