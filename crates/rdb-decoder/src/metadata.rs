use rdb_types::{Expiry, ObjectMetadata};

/// Metadata declared by opcodes for the next object.
///
/// Opcodes only ever write to the pending set; the engine drains it with
/// [`take_and_reset`](Self::take_and_reset) exactly once per object, after
/// the object has been decoded in full. Nothing carries over to the object
/// after it.
#[derive(Debug, Default)]
pub struct MetadataAccumulator {
    pending: ObjectMetadata,
}

impl MetadataAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_expire_seconds(&mut self, at_secs: u32) {
        self.pending.expire = Some(Expiry::Seconds(at_secs));
    }

    pub fn set_expire_millis(&mut self, at_ms: u64) {
        self.pending.expire = Some(Expiry::Milliseconds(at_ms));
    }

    pub fn set_frequency(&mut self, frequency: u8) {
        self.pending.frequency = Some(frequency);
    }

    pub fn set_idle(&mut self, idle_secs: u64) {
        self.pending.idle = Some(idle_secs);
    }

    /// Hand out the pending metadata and leave the accumulator empty.
    pub fn take_and_reset(&mut self) -> ObjectMetadata {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
