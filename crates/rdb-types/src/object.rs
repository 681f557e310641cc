use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::stream::StreamObject;
use crate::value_type::ValueType;

/// One decoded key with everything attached to it.
///
/// The envelope holds what every object has (database, key, metadata,
/// encoding tag); the payload holds the kind-specific data.
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ RedisObject                                      │
/// │   db:       u64            ← last SELECTDB       │
/// │   key:      Vec<u8>                              │
/// │   metadata: ObjectMetadata ← expire / freq / idle│
/// │   encoding: ValueType      ← on-disk tag         │
/// │   payload:  ObjectPayload  ← logical value       │
/// └──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RedisObject {
    pub db: u64,
    pub key: Vec<u8>,
    pub metadata: ObjectMetadata,
    pub encoding: ValueType,
    pub payload: ObjectPayload,
}

impl RedisObject {
    /// The key as text, with invalid UTF-8 replaced.
    pub fn key_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    pub fn kind(&self) -> ObjectKind {
        self.payload.kind()
    }
}

/// Logical value of an object. Compact encodings decode into the same
/// variant as their plain counterpart.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectPayload {
    String(Vec<u8>),
    List(Vec<Vec<u8>>),
    Set(Vec<Vec<u8>>),
    SortedSet(Vec<ScoredMember>),
    Hash(Vec<HashEntry>),
    Stream(Box<StreamObject>),
}

impl ObjectPayload {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::String(_) => ObjectKind::String,
            Self::List(_) => ObjectKind::List,
            Self::Set(_) => ObjectKind::Set,
            Self::SortedSet(_) => ObjectKind::SortedSet,
            Self::Hash(_) => ObjectKind::Hash,
            Self::Stream(_) => ObjectKind::Stream,
        }
    }

    /// Element count: bytes for a string, members for collections,
    /// live entries for a stream.
    pub fn len(&self) -> usize {
        match self {
            Self::String(bytes) => bytes.len(),
            Self::List(items) | Self::Set(items) => items.len(),
            Self::SortedSet(members) => members.len(),
            Self::Hash(entries) => entries.len(),
            Self::Stream(stream) => stream.entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    String,
    List,
    Set,
    SortedSet,
    Hash,
    Stream,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "zset",
            Self::Hash => "hash",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredMember {
    pub member: Vec<u8>,
    pub score: f64,
}

/// One hash field. `expire_ms` is only set by the per-field TTL encodings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashEntry {
    pub field: Vec<u8>,
    pub value: Vec<u8>,
    pub expire_ms: Option<u64>,
}

impl HashEntry {
    pub fn new(field: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            field,
            value,
            expire_ms: None,
        }
    }
}

/// Metadata that preceded an object in the stream.
///
/// Each field is set by its own opcode and is `None` when that opcode did
/// not appear since the previous object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub expire: Option<Expiry>,
    /// LFU access frequency counter.
    pub frequency: Option<u8>,
    /// LRU idle time in seconds.
    pub idle: Option<u64>,
}

impl ObjectMetadata {
    pub fn is_empty(&self) -> bool {
        self.expire.is_none() && self.frequency.is_none() && self.idle.is_none()
    }
}

/// Absolute expire time, in the precision the opcode used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// Unix seconds, from the 4-byte opcode.
    Seconds(u32),
    /// Unix milliseconds, from the 8-byte opcode.
    Milliseconds(u64),
}

impl Expiry {
    pub fn as_millis(self) -> u64 {
        match self {
            Self::Seconds(secs) => u64::from(secs) * 1000,
            Self::Milliseconds(ms) => ms,
        }
    }

    /// The expire time as a UTC timestamp, or `None` if it is out of
    /// chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.as_millis()).ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(at) => write!(f, "{}", at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.as_millis()),
        }
    }
}
