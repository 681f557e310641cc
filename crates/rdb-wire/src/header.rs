use std::io::Read;

use crate::cursor::ByteCursor;
use crate::error::WireError;

/// Magic prefix: ASCII "REDIS".
pub const RDB_MAGIC: [u8; 5] = *b"REDIS";

/// Total header size in bytes: magic plus four version digits.
pub const HEADER_SIZE: usize = 9;

/// Oldest format version this crate understands.
pub const MIN_SUPPORTED_VERSION: u32 = 1;

/// Newest format version this crate understands.
pub const MAX_SUPPORTED_VERSION: u32 = 12;

/// Dump file header, the first 9 bytes of every dump.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 5 bytes │ Magic: "REDIS"                   │
/// │ 0x05   │ 4 bytes │ Version, ASCII digits ("0012")   │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RdbHeader {
    pub version: u32,
}

impl RdbHeader {
    /// Read and validate the header from the start of the stream.
    ///
    /// Validation order is magic, then digits, then the supported range, so
    /// a file that is not a dump at all reports a magic error rather than a
    /// version one.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if fewer than 9 bytes are available.
    /// - [`WireError::InvalidMagic`] if the first five bytes are not `REDIS`.
    /// - [`WireError::InvalidVersion`] if the version is not four digits.
    /// - [`WireError::UnsupportedVersion`] if the version is outside
    ///   `min..=max`.
    pub fn read_from<R: Read>(
        cursor: &mut ByteCursor<R>,
        min: u32,
        max: u32,
    ) -> Result<Self, WireError> {
        let magic: [u8; 5] = cursor.read_array()?;
        if magic != RDB_MAGIC {
            return Err(WireError::InvalidMagic { found: magic });
        }

        let offset = cursor.position();
        let digits: [u8; 4] = cursor.read_array()?;
        let version = parse_version(&digits).ok_or(WireError::InvalidVersion {
            offset,
            found: digits,
        })?;

        if !(min..=max).contains(&version) {
            return Err(WireError::UnsupportedVersion { version, min, max });
        }

        Ok(Self { version })
    }

    /// Whether a checksum trailer follows the end marker.
    pub fn has_checksum(self) -> bool {
        self.version >= crate::checksum::CHECKSUM_MIN_VERSION
    }
}

fn parse_version(digits: &[u8; 4]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(bytes: &[u8]) -> Result<RdbHeader, WireError> {
        let mut cursor = ByteCursor::new(bytes);
        RdbHeader::read_from(&mut cursor, MIN_SUPPORTED_VERSION, MAX_SUPPORTED_VERSION)
    }

    #[test]
    fn parses_current_version() {
        let header = read(b"REDIS0012").unwrap();
        assert_eq!(header.version, 12);
        assert!(header.has_checksum());
    }

    #[test]
    fn old_versions_have_no_checksum() {
        let header = read(b"REDIS0004").unwrap();
        assert!(!header.has_checksum());
    }

    #[test]
    fn reject_bad_magic() {
        let result = read(b"RADIS0012");
        assert!(matches!(
            result,
            Err(WireError::InvalidMagic { found }) if &found == b"RADIS"
        ));
    }

    #[test]
    fn reject_non_digit_version() {
        let result = read(b"REDIS00x2");
        assert!(matches!(
            result,
            Err(WireError::InvalidVersion { offset: 5, .. })
        ));
    }

    #[test]
    fn reject_unsupported_version() {
        let result = read(b"REDIS0099");
        assert!(matches!(
            result,
            Err(WireError::UnsupportedVersion {
                version: 99,
                min: 1,
                max: 12
            })
        ));
    }

    #[test]
    fn custom_range_applies() {
        let mut cursor = ByteCursor::new(&b"REDIS0009"[..]);
        let result = RdbHeader::read_from(&mut cursor, 10, 12);
        assert!(matches!(
            result,
            Err(WireError::UnsupportedVersion { version: 9, .. })
        ));
    }

    #[test]
    fn reject_short_header() {
        let result = read(b"REDIS00");
        assert!(matches!(result, Err(WireError::UnexpectedEof { offset: 5, .. })));
    }

    #[test]
    fn version_zero_is_out_of_range() {
        assert!(matches!(
            read(b"REDIS0000"),
            Err(WireError::UnsupportedVersion { version: 0, .. })
        ));
    }
}
