//! Stream values.
//!
//! A stream is stored as a radix tree of listpack nodes. Each node is keyed
//! by a master ID (16 bytes, big-endian ms + seq) and holds a listpack that
//! delta-encodes its entries against that ID and against a "master" field
//! list shared by the node.

use std::fmt;

use crate::error::TypeError;
use crate::listpack;
use crate::packed::PackedValue;

const CONTAINER: &str = "stream listpack";

/// Entry flag: the entry has been deleted (XDEL) but not compacted away.
const FLAG_DELETED: i64 = 1;
/// Entry flag: the entry uses exactly the node's master fields.
const FLAG_SAME_FIELDS: i64 = 2;

/// Size of a raw stream ID on the wire.
pub const STREAM_ID_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parse a raw 16-byte ID (two big-endian u64s).
    pub fn from_bytes(raw: [u8; STREAM_ID_SIZE]) -> Self {
        let mut ms = [0u8; 8];
        let mut seq = [0u8; 8];
        ms.copy_from_slice(&raw[..8]);
        seq.copy_from_slice(&raw[8..]);
        Self {
            ms: u64::from_be_bytes(ms),
            seq: u64::from_be_bytes(seq),
        }
    }

    /// [`from_bytes`](Self::from_bytes) for a slice; `None` unless it is
    /// exactly 16 bytes.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        raw.try_into().ok().map(Self::from_bytes)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Vec<u8>, Vec<u8>)>,
}

/// A decoded stream with its consumer groups.
///
/// `first_id`, `max_deleted_id` and `entries_added` are only written by
/// the v2 and v3 encodings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamObject {
    /// Live entries in ID order.
    pub entries: Vec<StreamEntry>,
    /// Entry count as recorded by the writer.
    pub length: u64,
    pub last_id: StreamId,
    pub first_id: Option<StreamId>,
    pub max_deleted_id: Option<StreamId>,
    pub entries_added: Option<u64>,
    pub groups: Vec<ConsumerGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerGroup {
    pub name: Vec<u8>,
    pub last_id: StreamId,
    pub entries_read: Option<u64>,
    /// Group-wide pending entries list.
    pub pending: Vec<PendingEntry>,
    pub consumers: Vec<Consumer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    pub id: StreamId,
    pub delivery_time_ms: u64,
    pub delivery_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consumer {
    pub name: Vec<u8>,
    pub seen_time_ms: u64,
    /// Last successful interaction; v3 only.
    pub active_time_ms: Option<u64>,
    /// IDs this consumer owns in the group PEL.
    pub pending: Vec<StreamId>,
}

/// Rebuild the live entries of one listpack node.
///
/// ```text
/// master entry:  count │ deleted │ n │ field_1 .. field_n │ 0
/// each entry:    flags │ ms-diff │ seq-diff │
///                  SAME_FIELDS: value_1 .. value_n
///                  otherwise:   k │ field │ value │ ... (k pairs)
///                │ lp-count
/// ```
///
/// Entries flagged deleted are skipped.
///
/// # Errors
///
/// [`TypeError::CorruptContainer`] if the listpack itself is corrupt or the
/// element sequence does not follow the layout above.
pub fn decode_listpack_entries(master: StreamId, blob: &[u8]) -> Result<Vec<StreamEntry>, TypeError> {
    let elements = listpack::unpack(blob)?;
    let mut cursor = Elements {
        items: &elements,
        next: 0,
    };

    let live = cursor.next_count()?;
    let _deleted = cursor.next_count()?;
    let master_field_count = cursor.next_count()?;
    let master_fields = (0..master_field_count)
        .map(|_| cursor.next_value())
        .collect::<Result<Vec<_>, _>>()?;
    // Master entry terminator.
    cursor.next_int()?;

    let mut entries = Vec::with_capacity(live.min(1024));
    while !cursor.is_done() {
        let flags = cursor.next_int()?;
        let ms_diff = cursor.next_int()?;
        let seq_diff = cursor.next_int()?;
        let id = StreamId {
            ms: offset_by(master.ms, ms_diff, &cursor)?,
            seq: offset_by(master.seq, seq_diff, &cursor)?,
        };

        let fields = if flags & FLAG_SAME_FIELDS == 0 {
            let count = cursor.next_count()?;
            (0..count)
                .map(|_| -> Result<_, TypeError> {
                    let field = cursor.next_value()?.to_bytes();
                    let value = cursor.next_value()?.to_bytes();
                    Ok((field, value))
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            master_fields
                .iter()
                .map(|field| -> Result<_, TypeError> {
                    Ok((field.to_bytes(), cursor.next_value()?.to_bytes()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        // Back-pointer used for reverse iteration.
        cursor.next_int()?;

        if flags & FLAG_DELETED == 0 {
            entries.push(StreamEntry { id, fields });
        }
    }

    Ok(entries)
}

fn offset_by(base: u64, diff: i64, cursor: &Elements<'_, '_>) -> Result<u64, TypeError> {
    base.checked_add_signed(diff)
        .ok_or_else(|| cursor.corrupt(format!("ID delta {diff} overflows base {base}")))
}

/// Sequential reader over the unpacked listpack elements.
struct Elements<'e, 'b> {
    items: &'e [PackedValue<'b>],
    next: usize,
}

impl<'b> Elements<'_, 'b> {
    fn is_done(&self) -> bool {
        self.next >= self.items.len()
    }

    fn next_value(&mut self) -> Result<PackedValue<'b>, TypeError> {
        let value = self
            .items
            .get(self.next)
            .copied()
            .ok_or_else(|| self.corrupt("node ends mid-entry"))?;
        self.next += 1;
        Ok(value)
    }

    fn next_int(&mut self) -> Result<i64, TypeError> {
        let value = self.next_value()?;
        value
            .as_i64()
            .ok_or_else(|| self.corrupt("expected an integer element"))
    }

    fn next_count(&mut self) -> Result<usize, TypeError> {
        let value = self.next_int()?;
        usize::try_from(value).map_err(|_| self.corrupt(format!("negative count {value}")))
    }

    fn corrupt(&self, reason: impl Into<String>) -> TypeError {
        TypeError::corrupt(
            CONTAINER,
            0,
            format!("element {}: {}", self.next, reason.into()),
        )
    }
}
