#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod decompression;
pub mod error;
pub mod object_reader;
pub mod streaming;
pub mod string_reader;
pub mod summary;

mod metadata;

pub use config::{DecoderConfig, Opcode, OpcodeTable};
pub use decoder::{Control, DecodedDump, RdbDecoder};
pub use decompression::{DecompressFailure, Decompressor, LzfDecompressor};
pub use error::{DecodeError, ErrorKind};
pub use streaming::{EngineState, ObjectStream};
pub use summary::{DecodeSummary, ResizeHint};
