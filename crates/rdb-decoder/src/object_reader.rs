use std::io::Read;

use rdb_types::stream::{self, STREAM_ID_SIZE};
use rdb_types::{
    Consumer, ConsumerGroup, HashEntry, ObjectPayload, PackedValue, PendingEntry, ScoredMember,
    StreamId, StreamObject, TypeError, ValueType, intset, listpack, ziplist, zipmap,
};
use rdb_wire::ByteCursor;

use crate::error::DecodeError;
use crate::string_reader::StringReader;

/// Upper bound on up-front `Vec` capacity taken from a count in the
/// dump. Larger collections grow as elements actually arrive.
const PREALLOC_LIMIT: usize = 4096;

/// Quicklist v2 container kinds.
const QUICKLIST_PLAIN: u64 = 1;
const QUICKLIST_PACKED: u64 = 2;

/// Decodes the body that follows a value-type tag.
///
/// Compact encodings are read as one string (the blob), unpacked with the
/// `rdb-types` container parsers and turned into the same
/// [`ObjectPayload`] variant the plain encoding produces.
pub struct ObjectReader<'a, R> {
    cursor: &'a mut ByteCursor<R>,
    strings: StringReader<'a>,
}

impl<'a, R: Read> ObjectReader<'a, R> {
    pub fn new(cursor: &'a mut ByteCursor<R>, strings: StringReader<'a>) -> Self {
        Self { cursor, strings }
    }

    pub fn read_key(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.string()
    }

    /// Decode the payload for `value_type`. `tag_offset` is where the tag
    /// byte was read and is reported for unsupported types.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::UnknownObjectType`] for module types, the pre-GA
    ///   TTL hashes and unassigned tags.
    /// - [`DecodeError::CorruptContainer`] for an inconsistent blob.
    /// - Any string or length error from the body.
    pub fn read_payload(
        &mut self,
        value_type: ValueType,
        tag_offset: u64,
    ) -> Result<ObjectPayload, DecodeError> {
        let payload = match value_type {
            ValueType::String => ObjectPayload::String(self.string()?),
            ValueType::List => ObjectPayload::List(self.string_seq()?),
            ValueType::Set => ObjectPayload::Set(self.string_seq()?),
            ValueType::SortedSet => ObjectPayload::SortedSet(self.scored_members(false)?),
            ValueType::SortedSet2 => ObjectPayload::SortedSet(self.scored_members(true)?),
            ValueType::Hash => ObjectPayload::Hash(self.hash_entries()?),

            ValueType::HashZipmap => {
                let (offset, blob) = self.blob()?;
                let pairs = zipmap::unpack(&blob).map_err(|e| DecodeError::corrupt(offset, e))?;
                ObjectPayload::Hash(
                    pairs
                        .into_iter()
                        .map(|(field, value)| HashEntry::new(field.to_vec(), value.to_vec()))
                        .collect(),
                )
            }
            ValueType::ListZiplist => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::List(packed_strings(offset, ziplist::unpack(&blob))?)
            }
            ValueType::SetIntset => {
                let (offset, blob) = self.blob()?;
                let values = intset::unpack(&blob).map_err(|e| DecodeError::corrupt(offset, e))?;
                ObjectPayload::Set(
                    values
                        .into_iter()
                        .map(|v| v.to_string().into_bytes())
                        .collect(),
                )
            }
            ValueType::SortedSetZiplist => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::SortedSet(packed_scored(offset, "ziplist", ziplist::unpack(&blob))?)
            }
            ValueType::HashZiplist => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::Hash(packed_hash(offset, "ziplist", ziplist::unpack(&blob))?)
            }
            ValueType::ListQuicklist => ObjectPayload::List(self.quicklist()?),
            ValueType::HashListpack => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::Hash(packed_hash(offset, "listpack", listpack::unpack(&blob))?)
            }
            ValueType::SortedSetListpack => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::SortedSet(packed_scored(offset, "listpack", listpack::unpack(&blob))?)
            }
            ValueType::ListQuicklist2 => ObjectPayload::List(self.quicklist2()?),
            ValueType::SetListpack => {
                let (offset, blob) = self.blob()?;
                ObjectPayload::Set(packed_strings(offset, listpack::unpack(&blob))?)
            }
            ValueType::StreamListpacks => ObjectPayload::Stream(Box::new(self.stream(1)?)),
            ValueType::StreamListpacks2 => ObjectPayload::Stream(Box::new(self.stream(2)?)),
            ValueType::StreamListpacks3 => ObjectPayload::Stream(Box::new(self.stream(3)?)),
            ValueType::HashMetadata => ObjectPayload::Hash(self.ttl_hash()?),
            ValueType::HashListpackEx => ObjectPayload::Hash(self.ttl_hash_listpack()?),

            ValueType::Module
            | ValueType::Module2
            | ValueType::HashMetadataPreGa
            | ValueType::HashListpackExPreGa
            | ValueType::Unknown(_) => {
                return Err(DecodeError::UnknownObjectType {
                    offset: tag_offset,
                    type_tag: value_type.wire_id(),
                });
            }
        };
        Ok(payload)
    }

    // ── Plain encodings ───────────────────────────────────────────────────────

    fn string_seq(&mut self) -> Result<Vec<Vec<u8>>, DecodeError> {
        let count = self.count()?;
        let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            items.push(self.string()?);
        }
        Ok(items)
    }

    fn scored_members(&mut self, binary_scores: bool) -> Result<Vec<ScoredMember>, DecodeError> {
        let count = self.count()?;
        let mut members = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let member = self.string()?;
            let score = if binary_scores {
                self.strings.read_binary_double(self.cursor)?
            } else {
                self.strings.read_double_string(self.cursor)?
            };
            members.push(ScoredMember { member, score });
        }
        Ok(members)
    }

    fn hash_entries(&mut self) -> Result<Vec<HashEntry>, DecodeError> {
        let count = self.count()?;
        let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let field = self.string()?;
            let value = self.string()?;
            entries.push(HashEntry::new(field, value));
        }
        Ok(entries)
    }

    // ── Quicklists ────────────────────────────────────────────────────────────

    /// A count of ziplist blobs, concatenated.
    fn quicklist(&mut self) -> Result<Vec<Vec<u8>>, DecodeError> {
        let nodes = self.count()?;
        let mut items = Vec::new();
        for _ in 0..nodes {
            let (offset, blob) = self.blob()?;
            items.extend(packed_strings(offset, ziplist::unpack(&blob))?);
        }
        Ok(items)
    }

    /// A count of nodes, each a container kind followed by either a single
    /// plain element or a listpack blob.
    fn quicklist2(&mut self) -> Result<Vec<Vec<u8>>, DecodeError> {
        let nodes = self.count()?;
        let mut items = Vec::new();
        for _ in 0..nodes {
            let container_offset = self.cursor.position();
            match self.cursor.read_length()? {
                QUICKLIST_PLAIN => items.push(self.string()?),
                QUICKLIST_PACKED => {
                    let (offset, blob) = self.blob()?;
                    items.extend(packed_strings(offset, listpack::unpack(&blob))?);
                }
                other => {
                    return Err(corrupt_at(
                        container_offset,
                        "quicklist",
                        format!("unknown container kind {other}"),
                    ));
                }
            }
        }
        Ok(items)
    }

    // ── Hashes with per-field TTL ─────────────────────────────────────────────

    /// Minimum expire, then per field a relative TTL (0 = none, otherwise
    /// `min_expire + ttl - 1`), the field and the value.
    fn ttl_hash(&mut self) -> Result<Vec<HashEntry>, DecodeError> {
        let min_expire = self.strings.read_millis(self.cursor)?;
        let count = self.count()?;
        let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let ttl_offset = self.cursor.position();
            let ttl = self.cursor.read_length()?;
            let field = self.string()?;
            let value = self.string()?;

            let expire_ms = match ttl {
                0 => None,
                ttl => Some(min_expire.checked_add(ttl - 1).ok_or_else(|| {
                    corrupt_at(ttl_offset, "hash", format!("TTL {ttl} overflows"))
                })?),
            };
            entries.push(HashEntry {
                field,
                value,
                expire_ms,
            });
        }
        Ok(entries)
    }

    /// Minimum expire, then a listpack of (field, value, expire-ms)
    /// triplets with 0 meaning no expiry.
    fn ttl_hash_listpack(&mut self) -> Result<Vec<HashEntry>, DecodeError> {
        let _min_expire = self.strings.read_millis(self.cursor)?;
        let (offset, blob) = self.blob()?;
        let values = listpack::unpack(&blob).map_err(|e| DecodeError::corrupt(offset, e))?;

        if values.len() % 3 != 0 {
            return Err(corrupt_at(
                offset,
                "listpack",
                format!("{} elements do not form field/value/TTL triplets", values.len()),
            ));
        }

        values
            .chunks_exact(3)
            .map(|triplet| {
                let expire_ms = match triplet[2].as_i64() {
                    Some(0) => None,
                    Some(ms) if ms > 0 => Some(ms.unsigned_abs()),
                    _ => {
                        return Err(corrupt_at(offset, "listpack", "field TTL is not a timestamp"));
                    }
                };
                Ok(HashEntry {
                    field: triplet[0].to_bytes(),
                    value: triplet[1].to_bytes(),
                    expire_ms,
                })
            })
            .collect()
    }

    // ── Streams ───────────────────────────────────────────────────────────────

    fn stream(&mut self, layout: u8) -> Result<StreamObject, DecodeError> {
        let mut stream = StreamObject::default();

        let nodes = self.count()?;
        for _ in 0..nodes {
            let key_offset = self.cursor.position();
            let key = self.string()?;
            let master = StreamId::from_raw(&key).ok_or_else(|| {
                corrupt_at(
                    key_offset,
                    "stream",
                    format!("node key is {} bytes, expected {STREAM_ID_SIZE}", key.len()),
                )
            })?;
            let (offset, blob) = self.blob()?;
            let entries = stream::decode_listpack_entries(master, &blob)
                .map_err(|e| DecodeError::corrupt(offset, e))?;
            stream.entries.extend(entries);
        }

        stream.length = self.cursor.read_length()?;
        stream.last_id = self.length_id()?;
        if layout >= 2 {
            stream.first_id = Some(self.length_id()?);
            stream.max_deleted_id = Some(self.length_id()?);
            stream.entries_added = Some(self.cursor.read_length()?);
        }

        let groups = self.count()?;
        stream.groups.reserve(groups.min(PREALLOC_LIMIT));
        for _ in 0..groups {
            stream.groups.push(self.consumer_group(layout)?);
        }
        Ok(stream)
    }

    fn consumer_group(&mut self, layout: u8) -> Result<ConsumerGroup, DecodeError> {
        let name = self.string()?;
        let last_id = self.length_id()?;
        let entries_read = if layout >= 2 {
            Some(self.cursor.read_length()?)
        } else {
            None
        };

        let pel_size = self.count()?;
        let mut pending = Vec::with_capacity(pel_size.min(PREALLOC_LIMIT));
        for _ in 0..pel_size {
            let id = self.raw_id()?;
            let delivery_time_ms = self.strings.read_millis(self.cursor)?;
            let delivery_count = self.cursor.read_length()?;
            pending.push(PendingEntry {
                id,
                delivery_time_ms,
                delivery_count,
            });
        }

        let consumer_count = self.count()?;
        let mut consumers = Vec::with_capacity(consumer_count.min(PREALLOC_LIMIT));
        for _ in 0..consumer_count {
            let name = self.string()?;
            let seen_time_ms = self.strings.read_millis(self.cursor)?;
            let active_time_ms = if layout >= 3 {
                Some(self.strings.read_millis(self.cursor)?)
            } else {
                None
            };
            let owned = self.count()?;
            let mut ids = Vec::with_capacity(owned.min(PREALLOC_LIMIT));
            for _ in 0..owned {
                ids.push(self.raw_id()?);
            }
            consumers.push(Consumer {
                name,
                seen_time_ms,
                active_time_ms,
                pending: ids,
            });
        }

        Ok(ConsumerGroup {
            name,
            last_id,
            entries_read,
            pending,
            consumers,
        })
    }

    /// An ID written as two lengths (ms, seq).
    fn length_id(&mut self) -> Result<StreamId, DecodeError> {
        let ms = self.cursor.read_length()?;
        let seq = self.cursor.read_length()?;
        Ok(StreamId::new(ms, seq))
    }

    /// An ID written as 16 raw big-endian bytes.
    fn raw_id(&mut self) -> Result<StreamId, DecodeError> {
        Ok(StreamId::from_bytes(self.cursor.read_array()?))
    }

    // ── Primitives ────────────────────────────────────────────────────────────

    fn string(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.strings.read_string(self.cursor)
    }

    /// A container blob and the offset its string starts at.
    fn blob(&mut self) -> Result<(u64, Vec<u8>), DecodeError> {
        let offset = self.cursor.position();
        Ok((offset, self.string()?))
    }

    fn count(&mut self) -> Result<usize, DecodeError> {
        Ok(self.cursor.read_length_usize()?)
    }
}

fn corrupt_at(offset: u64, container: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::corrupt(
        offset,
        TypeError::CorruptContainer {
            container,
            offset: 0,
            reason: reason.into(),
        },
    )
}

fn packed_strings(
    offset: u64,
    unpacked: Result<Vec<PackedValue<'_>>, TypeError>,
) -> Result<Vec<Vec<u8>>, DecodeError> {
    let values = unpacked.map_err(|e| DecodeError::corrupt(offset, e))?;
    Ok(values.into_iter().map(PackedValue::to_bytes).collect())
}

/// Split an unpacked container into consecutive pairs.
fn packed_pairs<'b>(
    offset: u64,
    container: &'static str,
    unpacked: Result<Vec<PackedValue<'b>>, TypeError>,
) -> Result<Vec<(PackedValue<'b>, PackedValue<'b>)>, DecodeError> {
    let values = unpacked.map_err(|e| DecodeError::corrupt(offset, e))?;
    if values.len() % 2 != 0 {
        return Err(corrupt_at(
            offset,
            container,
            format!("{} elements do not form pairs", values.len()),
        ));
    }
    Ok(values.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}

fn packed_hash(
    offset: u64,
    container: &'static str,
    unpacked: Result<Vec<PackedValue<'_>>, TypeError>,
) -> Result<Vec<HashEntry>, DecodeError> {
    Ok(packed_pairs(offset, container, unpacked)?
        .into_iter()
        .map(|(field, value)| HashEntry::new(field.to_bytes(), value.to_bytes()))
        .collect())
}

fn packed_scored(
    offset: u64,
    container: &'static str,
    unpacked: Result<Vec<PackedValue<'_>>, TypeError>,
) -> Result<Vec<ScoredMember>, DecodeError> {
    packed_pairs(offset, container, unpacked)?
        .into_iter()
        .map(|(member, score)| {
            Ok(ScoredMember {
                member: member.to_bytes(),
                score: score.as_score().map_err(|e| DecodeError::corrupt(offset, e))?,
            })
        })
        .collect()
}
