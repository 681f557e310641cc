use rdb_wire::header::{MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION};
use rdb_wire::opcode;

/// Meaning assigned to a reserved control byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Eof,
    SelectDb,
    ResizeDb,
    ExpireTimeMs,
    ExpireTime,
    /// LFU frequency, one raw byte.
    Freq,
    /// LRU idle time, one length.
    Idle,
    /// LRU idle time at `0xF5`: a length whose special form `0xC0 | n` is
    /// followed by an `n`-byte little-endian value.
    LegacyIdle,
    Aux,
    /// Cluster slot info, three lengths. Skipped.
    SlotInfo,
    /// Function library, one string. Skipped.
    Function,
}

impl Opcode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::SelectDb => "SELECTDB",
            Self::ResizeDb => "RESIZEDB",
            Self::ExpireTimeMs => "EXPIRETIME_MS",
            Self::ExpireTime => "EXPIRETIME",
            Self::Freq => "FREQ",
            Self::Idle | Self::LegacyIdle => "IDLE",
            Self::Aux => "AUX",
            Self::SlotInfo => "SLOT_INFO",
            Self::Function => "FUNCTION",
        }
    }

    /// Opcodes that close off the current key and so must not follow
    /// pending metadata.
    pub fn ends_key_scope(self) -> bool {
        matches!(self, Self::Eof | Self::SelectDb | Self::ResizeDb | Self::Aux)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    opcode: Opcode,
    min_version: u32,
}

const TABLE_SIZE: usize = 256 - opcode::RESERVED_MIN as usize;

/// Maps reserved bytes (`0xF4..=0xFF`) to their meaning.
///
/// Writers disagree about `0xF4`/`0xF5`, so the mapping is data rather
/// than code. Each entry also names the first format version that uses it;
/// in an older dump the byte is not an opcode and falls through to the
/// value-type path, where it is rejected as an unknown object type.
///
/// ```text
/// ┌──────┬──────────────────┬──────────────────┬─────────┐
/// │ Byte │ legacy_v12()     │ standard()       │ Since   │
/// ├──────┼──────────────────┼──────────────────┼─────────┤
/// │ 0xF4 │ Freq             │ SlotInfo         │ 12 / 12 │
/// │ 0xF5 │ LegacyIdle       │ Function         │ 12 / 10 │
/// │ 0xF8 │ Idle             │ Idle             │ 9       │
/// │ 0xF9 │ Freq             │ Freq             │ 9       │
/// │ 0xFA │ Aux              │ Aux              │ 7       │
/// │ 0xFB │ ResizeDb         │ ResizeDb         │ 7       │
/// │ 0xFC │ ExpireTimeMs     │ ExpireTimeMs     │ 3       │
/// │ 0xFD │ ExpireTime       │ ExpireTime       │ 1       │
/// │ 0xFE │ SelectDb         │ SelectDb         │ 1       │
/// │ 0xFF │ Eof              │ Eof              │ 1       │
/// └──────┴──────────────────┴──────────────────┴─────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeTable {
    entries: [Option<Entry>; TABLE_SIZE],
}

impl OpcodeTable {
    /// A table with no assignments at all.
    pub fn empty() -> Self {
        Self {
            entries: [None; TABLE_SIZE],
        }
    }

    /// Assignments shared by every preset.
    fn base() -> Self {
        Self::empty()
            .with(opcode::IDLE, Opcode::Idle, 9)
            .with(opcode::FREQ, Opcode::Freq, 9)
            .with(opcode::AUX, Opcode::Aux, 7)
            .with(opcode::RESIZEDB, Opcode::ResizeDb, 7)
            .with(opcode::EXPIRETIME_MS, Opcode::ExpireTimeMs, 3)
            .with(opcode::EXPIRETIME, Opcode::ExpireTime, 1)
            .with(opcode::SELECTDB, Opcode::SelectDb, 1)
            .with(opcode::EOF, Opcode::Eof, 1)
    }

    /// Version-12 writers that put frequency at `0xF4` and idle time at
    /// `0xF5`.
    pub fn legacy_v12() -> Self {
        Self::base()
            .with(opcode::SLOT_INFO_OR_FREQ, Opcode::Freq, 12)
            .with(opcode::FUNCTION_OR_IDLE, Opcode::LegacyIdle, 12)
    }

    /// The upstream server's assignment.
    pub fn standard() -> Self {
        Self::base()
            .with(opcode::SLOT_INFO_OR_FREQ, Opcode::SlotInfo, 12)
            .with(opcode::FUNCTION_OR_IDLE, Opcode::Function, 10)
    }

    /// Assign `byte` to `opcode` from `min_version` on. Bytes below the
    /// reserved range are ignored; they are always value-type tags.
    #[must_use]
    pub fn with(mut self, byte: u8, opcode: Opcode, min_version: u32) -> Self {
        if let Some(slot) = Self::slot(byte) {
            self.entries[slot] = Some(Entry {
                opcode,
                min_version,
            });
        }
        self
    }

    #[must_use]
    pub fn without(mut self, byte: u8) -> Self {
        if let Some(slot) = Self::slot(byte) {
            self.entries[slot] = None;
        }
        self
    }

    /// The opcode `byte` stands for in a dump of `version`, if any.
    pub fn resolve(&self, byte: u8, version: u32) -> Option<Opcode> {
        let entry = self.entries[Self::slot(byte)?]?;
        (version >= entry.min_version).then_some(entry.opcode)
    }

    fn slot(byte: u8) -> Option<usize> {
        opcode::is_reserved(byte).then(|| usize::from(byte - opcode::RESERVED_MIN))
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::legacy_v12()
    }
}

/// Decoder settings.
///
/// ```text
/// ┌──────────────────┬──────────────┬───────────────────────────────────┐
/// │ Field            │ Default      │ Effect                            │
/// ├──────────────────┼──────────────┼───────────────────────────────────┤
/// │ verify_checksum  │ true         │ compare the CRC-64 trailer        │
/// │ min_version      │ 1            │ lowest accepted header version    │
/// │ max_version      │ 12           │ highest accepted header version   │
/// │ opcodes          │ legacy_v12() │ meaning of reserved bytes         │
/// └──────────────────┴──────────────┴───────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub verify_checksum: bool,
    pub min_version: u32,
    pub max_version: u32,
    pub opcodes: OpcodeTable,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            min_version: MIN_SUPPORTED_VERSION,
            max_version: MAX_SUPPORTED_VERSION,
            opcodes: OpcodeTable::default(),
        }
    }
}
