use rdb_types::TypeError;
use rdb_wire::WireError;

/// Errors that can occur while decoding a dump.
///
/// Every error is fatal to the parse call that raised it. Objects already
/// handed to the callback stand; nothing is emitted afterwards.
///
/// ```text
///   DecodeError
///   ├── InvalidHeader          ← magic or version digits wrong
///   ├── UnsupportedVersion     ← version outside the configured range
///   ├── TruncatedInput         ← source ran dry mid-field
///   ├── InvalidLength          ← reserved length tag, or wrong length form
///   ├── DecompressionMismatch  ← LZF failed or produced the wrong size
///   ├── DanglingMetadata       ← metadata opcode with no object after it
///   ├── UnknownObjectType      ← value-type tag not supported
///   ├── ChecksumMismatch       ← trailer disagrees with the computed CRC
///   ├── CorruptContainer       ← compact blob is internally inconsistent
///   └── Io                     ← non-EOF failure of the source
/// ```
///
/// All variants except `Io` carry the absolute byte offset, counted from
/// the first header byte.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid header at offset {offset}: {reason}")]
    InvalidHeader { offset: u64, reason: String },

    #[error("unsupported version {version} at offset {offset}, accepted range is {min}..={max}")]
    UnsupportedVersion {
        offset: u64,
        version: u32,
        min: u32,
        max: u32,
    },

    /// The source ended in the middle of a field. `offset` is where the
    /// field started.
    #[error("truncated input at offset {offset}: {needed} more bytes needed")]
    TruncatedInput { offset: u64, needed: usize },

    /// A length prefix used a reserved tag, or an integer/compressed form
    /// where only a plain length is allowed.
    #[error("invalid length encoding {byte:#04X} at offset {offset}")]
    InvalidLength { offset: u64, byte: u8 },

    #[error("decompression of block at offset {offset} failed: {reason}")]
    DecompressionMismatch {
        offset: u64,
        expected: u64,
        reason: String,
    },

    /// A database-select, resize-hint, auxiliary or end-of-file opcode
    /// arrived while key metadata was still pending.
    #[error("opcode {opcode:#04X} at offset {offset} follows key metadata with no object")]
    DanglingMetadata { offset: u64, opcode: u8 },

    #[error("unknown object type {type_tag} at offset {offset}")]
    UnknownObjectType { offset: u64, type_tag: u8 },

    #[error(
        "checksum mismatch at offset {offset}: stored {expected:#018x}, computed {computed:#018x}"
    )]
    ChecksumMismatch {
        offset: u64,
        expected: u64,
        computed: u64,
    },

    /// `offset` is where the blob (or score) starts in the dump; the
    /// source carries the position inside the blob.
    #[error("corrupt value at offset {offset}: {source}")]
    CorruptContainer {
        offset: u64,
        #[source]
        source: TypeError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Field-less mirror of [`DecodeError`] for matching and reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHeader,
    UnsupportedVersion,
    TruncatedInput,
    InvalidLength,
    DecompressionMismatch,
    DanglingMetadata,
    UnknownObjectType,
    ChecksumMismatch,
    CorruptContainer,
    Io,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHeader { .. } => ErrorKind::InvalidHeader,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::InvalidLength { .. } => ErrorKind::InvalidLength,
            Self::DecompressionMismatch { .. } => ErrorKind::DecompressionMismatch,
            Self::DanglingMetadata { .. } => ErrorKind::DanglingMetadata,
            Self::UnknownObjectType { .. } => ErrorKind::UnknownObjectType,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::CorruptContainer { .. } => ErrorKind::CorruptContainer,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Absolute byte offset of the failure, `None` only for I/O errors.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::InvalidHeader { offset, .. }
            | Self::UnsupportedVersion { offset, .. }
            | Self::TruncatedInput { offset, .. }
            | Self::InvalidLength { offset, .. }
            | Self::DecompressionMismatch { offset, .. }
            | Self::DanglingMetadata { offset, .. }
            | Self::UnknownObjectType { offset, .. }
            | Self::ChecksumMismatch { offset, .. }
            | Self::CorruptContainer { offset, .. } => Some(*offset),
            Self::Io(_) => None,
        }
    }

    pub(crate) fn corrupt(offset: u64, source: TypeError) -> Self {
        Self::CorruptContainer { offset, source }
    }
}

impl From<WireError> for DecodeError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::UnexpectedEof { offset, needed } => Self::TruncatedInput { offset, needed },
            WireError::InvalidMagic { found } => Self::InvalidHeader {
                offset: 0,
                reason: format!("magic {:?} is not \"REDIS\"", String::from_utf8_lossy(&found)),
            },
            WireError::InvalidVersion { offset, found } => Self::InvalidHeader {
                offset,
                reason: format!(
                    "version {:?} is not four ASCII digits",
                    String::from_utf8_lossy(&found)
                ),
            },
            WireError::UnsupportedVersion { version, min, max } => Self::UnsupportedVersion {
                offset: 5,
                version,
                min,
                max,
            },
            WireError::InvalidLength { offset, byte } => Self::InvalidLength { offset, byte },
            WireError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_errors_map_onto_kinds() {
        let cases = [
            (
                WireError::UnexpectedEof {
                    offset: 12,
                    needed: 3,
                },
                ErrorKind::TruncatedInput,
                Some(12),
            ),
            (
                WireError::InvalidMagic { found: *b"RADIS" },
                ErrorKind::InvalidHeader,
                Some(0),
            ),
            (
                WireError::InvalidVersion {
                    offset: 5,
                    found: *b"00x1",
                },
                ErrorKind::InvalidHeader,
                Some(5),
            ),
            (
                WireError::UnsupportedVersion {
                    version: 99,
                    min: 1,
                    max: 12,
                },
                ErrorKind::UnsupportedVersion,
                Some(5),
            ),
            (
                WireError::InvalidLength {
                    offset: 40,
                    byte: 0x82,
                },
                ErrorKind::InvalidLength,
                Some(40),
            ),
        ];

        for (wire, kind, offset) in cases {
            let err = DecodeError::from(wire);
            assert_eq!(err.kind(), kind);
            assert_eq!(err.offset(), offset);
        }
    }

    #[test]
    fn io_has_no_offset() {
        let err = DecodeError::from(WireError::Io(std::io::Error::other("disk gone")));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn messages_carry_offsets() {
        let err = DecodeError::UnknownObjectType {
            offset: 17,
            type_tag: 6,
        };
        assert_eq!(err.to_string(), "unknown object type 6 at offset 17");

        let err = DecodeError::ChecksumMismatch {
            offset: 30,
            expected: 1,
            computed: 2,
        };
        assert!(err.to_string().contains("offset 30"));
    }
}
