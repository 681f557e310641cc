#![warn(clippy::pedantic)]

pub mod checksum;
pub mod cursor;
pub mod error;
pub mod header;
pub mod length;
pub mod opcode;

pub use checksum::{Checksum, Crc64Redis, NoChecksum};
pub use cursor::ByteCursor;
pub use error::WireError;
pub use header::RdbHeader;
pub use length::LengthValue;
