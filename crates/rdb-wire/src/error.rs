/// Byte-level failures raised while reading the raw dump stream.
///
/// Every variant that can be pinned to a position carries the absolute
/// byte offset from the first header byte, so a corrupt dump can be
/// inspected with a hex viewer at exactly the right spot.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The byte source ran dry in the middle of a field.
    #[error("unexpected end of input at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: u64, needed: usize },

    /// The first five bytes were not `REDIS`.
    #[error("invalid magic {found:?} at offset 0, expected \"REDIS\"")]
    InvalidMagic { found: [u8; 5] },

    /// The four version bytes were not ASCII digits.
    #[error("invalid version digits {found:?} at offset {offset}")]
    InvalidVersion { offset: u64, found: [u8; 4] },

    /// The version parsed but falls outside the accepted range.
    #[error("unsupported version {version}, accepted range is {min}..={max}")]
    UnsupportedVersion { version: u32, min: u32, max: u32 },

    /// A length prefix used a reserved tag pattern.
    #[error("invalid length encoding {byte:#04X} at offset {offset}")]
    InvalidLength { offset: u64, byte: u8 },

    /// I/O error other than a clean end of input.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Byte offset at which the error was detected, when known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::UnexpectedEof { offset, .. }
            | Self::InvalidVersion { offset, .. }
            | Self::InvalidLength { offset, .. } => Some(*offset),
            Self::InvalidMagic { .. } => Some(0),
            Self::UnsupportedVersion { .. } => Some(5),
            Self::Io(_) => None,
        }
    }
}
