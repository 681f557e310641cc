//! Text rendering of decoded objects for `rdb inspect`.

use std::fmt::Write as _;

use rdb_types::{ObjectMetadata, ObjectPayload, RedisObject};

/// Longest element text printed by `--show-values`.
const MAX_VALUE_CHARS: usize = 80;

/// One summary line per object.
///
/// ```text
/// db=0 hash "user:1" 3 fields [hash-listpack] expire=2024-01-01T00:00:00.000Z freq=5
/// ```
pub fn object_line(object: &RedisObject) -> String {
    let mut line = format!(
        "db={} {} {:?} {} [{}]",
        object.db,
        object.kind(),
        object.key_str(),
        size_label(&object.payload),
        object.encoding.name(),
    );
    push_metadata(&mut line, &object.metadata);
    line
}

fn size_label(payload: &ObjectPayload) -> String {
    let n = payload.len();
    let plural = |word: &str| format!("{n} {word}{}", if n == 1 { "" } else { "s" });
    match payload {
        ObjectPayload::String(_) => plural("byte"),
        ObjectPayload::List(_) => plural("element"),
        ObjectPayload::Set(_) | ObjectPayload::SortedSet(_) => plural("member"),
        ObjectPayload::Hash(_) => plural("field"),
        ObjectPayload::Stream(stream) => format!(
            "{n} {}, {} group(s)",
            if n == 1 { "entry" } else { "entries" },
            stream.groups.len()
        ),
    }
}

fn push_metadata(line: &mut String, metadata: &ObjectMetadata) {
    if let Some(expire) = metadata.expire {
        let _ = write!(line, " expire={expire}");
    }
    if let Some(frequency) = metadata.frequency {
        let _ = write!(line, " freq={frequency}");
    }
    if let Some(idle) = metadata.idle {
        let _ = write!(line, " idle={idle}s");
    }
}

/// Indented element lines printed under an object by `--show-values`.
pub fn value_lines(payload: &ObjectPayload) -> Vec<String> {
    match payload {
        ObjectPayload::String(bytes) => vec![clip(bytes)],
        ObjectPayload::List(items) | ObjectPayload::Set(items) => {
            items.iter().map(|item| clip(item)).collect()
        }
        ObjectPayload::SortedSet(members) => members
            .iter()
            .map(|m| format!("{} (score {})", clip(&m.member), m.score))
            .collect(),
        ObjectPayload::Hash(entries) => entries
            .iter()
            .map(|e| {
                let mut line = format!("{} => {}", clip(&e.field), clip(&e.value));
                if let Some(ms) = e.expire_ms {
                    let _ = write!(line, " (expires at {ms}ms)");
                }
                line
            })
            .collect(),
        ObjectPayload::Stream(stream) => {
            let entries = stream.entries.iter().map(|entry| {
                let fields: Vec<String> = entry
                    .fields
                    .iter()
                    .map(|(f, v)| format!("{}={}", clip(f), clip(v)))
                    .collect();
                format!("{} {}", entry.id, fields.join(" "))
            });
            let groups = stream.groups.iter().map(|g| {
                format!(
                    "group {} last={} pending={} consumers={}",
                    clip(&g.name),
                    g.last_id,
                    g.pending.len(),
                    g.consumers.len()
                )
            });
            entries.chain(groups).collect()
        }
    }
}

/// Lossy UTF-8, cut to [`MAX_VALUE_CHARS`] with an ellipsis.
fn clip(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.chars().count() > MAX_VALUE_CHARS {
        let head: String = text.chars().take(MAX_VALUE_CHARS).collect();
        format!("{head}…")
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use rdb_decoder::RdbDecoder;
    use rdb_tests::DumpBuilder;

    use super::*;

    fn decode(dump: &[u8]) -> Vec<RedisObject> {
        RdbDecoder::new()
            .decode(dump)
            .unwrap_or_else(|e| panic!("decode failed: {e}"))
            .objects
    }

    #[test]
    fn object_lines() {
        let dump = DumpBuilder::new(12)
            .select_db(0)
            .expire_ms(1_704_067_200_000)
            .freq(5)
            .string_object(b"greeting", b"hello")
            .select_db(2)
            .idle(30)
            .list_object(b"queue", &[b"a", b"b"])
            .hash_object(b"user:1", &[(b"name", b"ada")])
            .finish();

        let lines: Vec<String> = decode(&dump).iter().map(object_line).collect();
        insta::assert_snapshot!(lines.join("\n"), @r#"
        db=0 string "greeting" 5 bytes [string] expire=2024-01-01T00:00:00.000Z freq=5
        db=2 list "queue" 2 elements [list] idle=30s
        db=2 hash "user:1" 1 field [hash]
        "#);
    }

    #[test]
    fn values_are_clipped() {
        let long = vec![b'x'; 100];
        let dump = DumpBuilder::new(12)
            .string_object(b"big", &long)
            .hash_object(b"h", &[(b"f", b"v")])
            .finish();

        let objects = decode(&dump);
        let string_lines = value_lines(&objects[0].payload);
        assert_eq!(string_lines[0].chars().count(), MAX_VALUE_CHARS + 1);
        assert!(string_lines[0].ends_with('…'));
        insta::assert_snapshot!(value_lines(&objects[1].payload).join("\n"), @"f => v");
    }
}
