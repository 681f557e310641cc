//! Reserved control bytes.
//!
//! Opcodes live at the top of the byte range so they can never collide
//! with a value-type tag. Two assignments exist for the `0xF4`/`0xF5`
//! pair: the upstream server uses them for slot info and functions, while
//! some version-12 writers put the frequency and idle metadata there. The
//! decoder resolves them through a configurable table; this module only
//! names the bytes.

/// Lowest byte in the reserved opcode range.
pub const RESERVED_MIN: u8 = 0xF4;

/// Cluster slot info (upstream) or frequency (some v12 writers).
pub const SLOT_INFO_OR_FREQ: u8 = 0xF4;
/// Function library payload (upstream) or idle time (some v12 writers).
pub const FUNCTION_OR_IDLE: u8 = 0xF5;
/// Pre-release function payload.
pub const FUNCTION_PRE_GA: u8 = 0xF6;
/// Module auxiliary data.
pub const MODULE_AUX: u8 = 0xF7;
/// LRU idle time of the next key, as a length.
pub const IDLE: u8 = 0xF8;
/// LFU frequency of the next key, as one raw byte.
pub const FREQ: u8 = 0xF9;
/// Auxiliary key/value field, two strings.
pub const AUX: u8 = 0xFA;
/// Hash table size hints, two lengths.
pub const RESIZEDB: u8 = 0xFB;
/// Expire time of the next key, 8-byte LE milliseconds.
pub const EXPIRETIME_MS: u8 = 0xFC;
/// Expire time of the next key, 4-byte LE seconds.
pub const EXPIRETIME: u8 = 0xFD;
/// Database selector, one length.
pub const SELECTDB: u8 = 0xFE;
/// End of the dataset; the checksum trailer follows.
pub const EOF: u8 = 0xFF;

/// Whether `byte` sits in the reserved opcode range.
pub fn is_reserved(byte: u8) -> bool {
    byte >= RESERVED_MIN
}
