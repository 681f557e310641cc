//! Test support for the dump decoder workspace.
//!
//! [`DumpBuilder`] writes dump files byte by byte and [`pack`] encodes the
//! compact container blobs that go inside them. Neither is a general
//! encoder: they exist so fixtures can be built in code instead of being
//! checked in as opaque binaries.

#![allow(clippy::pedantic)]

pub mod dump;
pub mod pack;

pub use dump::DumpBuilder;

/// Decode a hex literal, ignoring whitespace.
///
/// # Panics
///
/// If the literal is not valid hex.
pub fn from_hex(text: &str) -> Vec<u8> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(&compact).unwrap_or_else(|e| panic!("bad hex fixture {text:?}: {e}"))
}
