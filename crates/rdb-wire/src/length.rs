use std::io::Read;

use crate::cursor::ByteCursor;
use crate::error::WireError;

// Two high bits of the first byte select the length form.
const LEN_6BIT: u8 = 0b00;
const LEN_14BIT: u8 = 0b01;
const LEN_WIDE: u8 = 0b10;
const LEN_SPECIAL: u8 = 0b11;

/// `10xxxxxx` forms that are actually assigned.
const LEN_32BIT: u8 = 0x80;
const LEN_64BIT: u8 = 0x81;

/// Low six bits under the special form.
pub mod special {
    pub const INT8: u8 = 0;
    pub const INT16: u8 = 1;
    pub const INT32: u8 = 2;
    pub const LZF: u8 = 3;
}

/// One decoded length prefix.
///
/// The same prefix slot is used for three different things, so callers
/// must inspect the variant rather than assume a byte count:
///
/// ```text
/// ┌────────────┬──────────────────────────┬───────────────────────────┐
/// │ First byte │ Variant                  │ Meaning                   │
/// ├────────────┼──────────────────────────┼───────────────────────────┤
/// │ 00xxxxxx   │ Len (6-bit)              │ read N raw bytes          │
/// │ 01xxxxxx   │ Len (14-bit, +1 byte)    │ read N raw bytes          │
/// │ 0x80       │ Len (32-bit BE, +4)      │ read N raw bytes          │
/// │ 0x81       │ Len (64-bit BE, +8)      │ read N raw bytes          │
/// │ 0xC0..0xC2 │ Integer (8/16/32-bit LE) │ value is already decoded  │
/// │ 0xC3       │ Compressed               │ LZF block follows         │
/// └────────────┴──────────────────────────┴───────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthValue {
    /// A plain byte length or count.
    Len(u64),
    /// A small integer stored inline in place of a string.
    Integer(i64),
    /// An LZF block follows: `compressed_len` bytes that expand to
    /// `original_len` bytes.
    Compressed {
        compressed_len: u64,
        original_len: u64,
    },
}

impl<R: Read> ByteCursor<R> {
    /// Decode one length prefix, including the special integer and
    /// compressed-string forms.
    ///
    /// # Errors
    ///
    /// - [`WireError::InvalidLength`] for a reserved tag pattern. The offset
    ///   points at the tag byte.
    /// - [`WireError::UnexpectedEof`] if the prefix is cut short.
    pub fn read_length_value(&mut self) -> Result<LengthValue, WireError> {
        self.read_tagged_length().map(|(_, value)| value)
    }

    /// [`read_length_value`](Self::read_length_value), also returning the
    /// first byte so callers can report it.
    ///
    /// # Errors
    ///
    /// Same as [`read_length_value`](Self::read_length_value).
    pub fn read_tagged_length(&mut self) -> Result<(u8, LengthValue), WireError> {
        let offset = self.position();
        let first = self.read_u8()?;
        let value = self.length_after(offset, first)?;
        Ok((first, value))
    }

    /// A length whose special form names its own byte width.
    ///
    /// ```text
    /// 00xxxxxx / 01xxxxxx / 0x80 / 0x81   plain length, as read_length
    /// 0xC0 | n  (n in 1..=8)              n-byte little-endian unsigned
    /// ```
    ///
    /// Writers that put idle time at `0xF5` encode it this way, so
    /// `C2 E8 03` is 1000.
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidLength`] for a width outside `1..=8` or a reserved
    /// wide pattern, plus [`WireError::UnexpectedEof`].
    pub fn read_width_prefixed(&mut self) -> Result<u64, WireError> {
        let offset = self.position();
        let first = self.read_u8()?;
        if first >> 6 != LEN_SPECIAL {
            return match self.length_after(offset, first)? {
                LengthValue::Len(len) => Ok(len),
                LengthValue::Integer(_) | LengthValue::Compressed { .. } => {
                    Err(WireError::InvalidLength { offset, byte: first })
                }
            };
        }

        let width = usize::from(first & 0x3F);
        if !(1..=8).contains(&width) {
            return Err(WireError::InvalidLength { offset, byte: first });
        }
        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(&self.read_bytes(width)?);
        Ok(u64::from_le_bytes(raw))
    }

    /// Decode the rest of a length prefix whose first byte has been read.
    fn length_after(&mut self, offset: u64, first: u8) -> Result<LengthValue, WireError> {
        let value = match first >> 6 {
            LEN_6BIT => LengthValue::Len(u64::from(first & 0x3F)),
            LEN_14BIT => {
                let next = self.read_u8()?;
                LengthValue::Len((u64::from(first & 0x3F) << 8) | u64::from(next))
            }
            LEN_WIDE => match first {
                LEN_32BIT => LengthValue::Len(u64::from(u32::from_be_bytes(self.read_array()?))),
                LEN_64BIT => LengthValue::Len(u64::from_be_bytes(self.read_array()?)),
                byte => return Err(WireError::InvalidLength { offset, byte }),
            },
            _ => match first & 0x3F {
                special::INT8 => {
                    LengthValue::Integer(i64::from(i8::from_le_bytes(self.read_array()?)))
                }
                special::INT16 => {
                    LengthValue::Integer(i64::from(i16::from_le_bytes(self.read_array()?)))
                }
                special::INT32 => {
                    LengthValue::Integer(i64::from(i32::from_le_bytes(self.read_array()?)))
                }
                special::LZF => {
                    let compressed_len = self.read_length()?;
                    let original_len = self.read_length()?;
                    LengthValue::Compressed {
                        compressed_len,
                        original_len,
                    }
                }
                _ => {
                    return Err(WireError::InvalidLength {
                        offset,
                        byte: first,
                    });
                }
            },
        };
        Ok(value)
    }

    /// Decode a length prefix that must be a plain length (counts, db
    /// indexes, nested sizes).
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidLength`] if the prefix uses the integer or
    /// compressed form, plus everything from
    /// [`read_length_value`](Self::read_length_value).
    pub fn read_length(&mut self) -> Result<u64, WireError> {
        let offset = self.position();
        match self.read_tagged_length()? {
            (_, LengthValue::Len(len)) => Ok(len),
            (byte, LengthValue::Integer(_) | LengthValue::Compressed { .. }) => {
                Err(WireError::InvalidLength { offset, byte })
            }
        }
    }

    /// [`read_length`](Self::read_length) narrowed to `usize`.
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidLength`] if the value does not fit in `usize`.
    pub fn read_length_usize(&mut self) -> Result<usize, WireError> {
        let offset = self.position();
        let (byte, value) = self.read_tagged_length()?;
        match value {
            LengthValue::Len(len) => {
                usize::try_from(len).map_err(|_| WireError::InvalidLength { offset, byte })
            }
            LengthValue::Integer(_) | LengthValue::Compressed { .. } => {
                Err(WireError::InvalidLength { offset, byte })
            }
        }
    }
}
