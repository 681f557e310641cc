/// Hash table size hints from a resize-db opcode. Advisory only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeHint {
    /// Database selected when the hint was read.
    pub db: u64,
    pub db_size: u64,
    pub expires_size: u64,
}

/// What a parse call saw besides the objects themselves.
///
/// ```text
/// ┌────────────────────┬──────────────────────────────────────────────┐
/// │ Field              │ Filled by                                    │
/// ├────────────────────┼──────────────────────────────────────────────┤
/// │ version            │ header                                       │
/// │ aux                │ AUX opcodes, in dump order                   │
/// │ resize_hints       │ RESIZEDB opcodes                             │
/// │ databases          │ SELECTDB opcodes, first occurrence only      │
/// │ objects            │ every object handed out                      │
/// │ stopped_early      │ the consumer stopped before the end marker   │
/// │ stored_checksum    │ trailer, version >= 5                        │
/// │ computed_checksum  │ running CRC, only when verification is on    │
/// └────────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub version: u32,
    pub aux: Vec<(Vec<u8>, Vec<u8>)>,
    pub resize_hints: Vec<ResizeHint>,
    pub databases: Vec<u64>,
    pub objects: u64,
    pub stopped_early: bool,
    pub stored_checksum: Option<u64>,
    pub computed_checksum: Option<u64>,
}

impl DecodeSummary {
    /// Value of the last aux field named `key`.
    pub fn aux_value(&self, key: &[u8]) -> Option<&[u8]> {
        self.aux
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Whether the trailer was compared against the computed checksum.
    /// A stored value of 0 means the writer had checksums disabled.
    pub fn checksum_verified(&self) -> bool {
        matches!(
            (self.stored_checksum, self.computed_checksum),
            (Some(stored), Some(computed)) if stored != 0 && stored == computed
        )
    }

    pub(crate) fn note_database(&mut self, db: u64) {
        if !self.databases.contains(&db) {
            self.databases.push(db);
        }
    }
}
