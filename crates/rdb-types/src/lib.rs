#![warn(clippy::pedantic)]

pub mod error;
pub mod packed;
pub mod ziplist;
pub mod listpack;
pub mod intset;
pub mod zipmap;
pub mod value_type;
pub mod stream;
pub mod object;

pub use error::TypeError;
pub use object::{
    Expiry, HashEntry, ObjectKind, ObjectMetadata, ObjectPayload, RedisObject, ScoredMember,
};
pub use packed::PackedValue;
pub use stream::{Consumer, ConsumerGroup, PendingEntry, StreamEntry, StreamId, StreamObject};
pub use value_type::ValueType;
