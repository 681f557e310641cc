use std::io::Read;

use rdb_types::TypeError;
use rdb_types::packed::parse_score;
use rdb_wire::{ByteCursor, LengthValue};

use crate::decompression::Decompressor;
use crate::error::DecodeError;

/// Score length bytes with a fixed meaning in the text score encoding.
const SCORE_NAN: u8 = 253;
const SCORE_POS_INF: u8 = 254;
const SCORE_NEG_INF: u8 = 255;

/// Reads the string forms of the format: raw, inline integer and LZF.
///
/// Holds only the decompressor, so it is `Copy` and can be handed to the
/// object reader alongside a mutable cursor.
#[derive(Clone, Copy)]
pub struct StringReader<'d> {
    decompressor: &'d dyn Decompressor,
}

impl<'d> StringReader<'d> {
    pub fn new(decompressor: &'d dyn Decompressor) -> Self {
        Self { decompressor }
    }

    /// Read one string in whichever form its length prefix selects.
    ///
    /// ```text
    /// Len(n)                  → next n bytes
    /// Integer(v)              → decimal text of v
    /// Compressed{clen, len}   → next clen bytes, LZF-expanded to len
    /// ```
    ///
    /// # Errors
    ///
    /// - [`DecodeError::DecompressionMismatch`] if the LZF block fails to
    ///   expand or expands to the wrong size. The offset is the prefix.
    /// - Wire errors from the length prefix or the payload bytes.
    pub fn read_string<R: Read>(self, cursor: &mut ByteCursor<R>) -> Result<Vec<u8>, DecodeError> {
        let offset = cursor.position();
        match cursor.read_length_value()? {
            LengthValue::Len(len) => {
                let len = to_usize(len, offset)?;
                Ok(cursor.read_bytes(len)?)
            }
            LengthValue::Integer(value) => Ok(value.to_string().into_bytes()),
            LengthValue::Compressed {
                compressed_len,
                original_len,
            } => {
                let compressed = cursor.read_bytes(to_usize(compressed_len, offset)?)?;
                let expected = to_usize(original_len, offset)?;
                let mismatch = |reason: String| DecodeError::DecompressionMismatch {
                    offset,
                    expected: original_len,
                    reason,
                };

                let out = self
                    .decompressor
                    .decompress(&compressed, expected)
                    .map_err(|e| mismatch(e.0))?;
                if out.len() != expected {
                    return Err(mismatch(format!(
                        "expanded to {} bytes, expected {expected}",
                        out.len()
                    )));
                }
                Ok(out)
            }
        }
    }

    /// Score in the old text form: a one-byte length, with 253/254/255
    /// standing for NaN, +inf and -inf.
    ///
    /// # Errors
    ///
    /// [`DecodeError::CorruptContainer`] if the text is not a number.
    pub fn read_double_string<R: Read>(self, cursor: &mut ByteCursor<R>) -> Result<f64, DecodeError> {
        let offset = cursor.position();
        match cursor.read_u8()? {
            SCORE_NAN => Ok(f64::NAN),
            SCORE_POS_INF => Ok(f64::INFINITY),
            SCORE_NEG_INF => Ok(f64::NEG_INFINITY),
            len => {
                let text = cursor.read_bytes(usize::from(len))?;
                parse_score(&text).map_err(|e| DecodeError::corrupt(offset, e))
            }
        }
    }

    /// Score as 8 bytes of little-endian IEEE 754.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedInput`] if fewer than 8 bytes remain.
    pub fn read_binary_double<R: Read>(self, cursor: &mut ByteCursor<R>) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(cursor.read_array()?))
    }

    /// Millisecond timestamp, 8 bytes little-endian.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedInput`] if fewer than 8 bytes remain.
    pub fn read_millis<R: Read>(self, cursor: &mut ByteCursor<R>) -> Result<u64, DecodeError> {
        Ok(cursor.read_u64_le()?)
    }
}

fn to_usize(len: u64, offset: u64) -> Result<usize, DecodeError> {
    usize::try_from(len).map_err(|_| {
        DecodeError::corrupt(
            offset,
            TypeError::CorruptContainer {
                container: "string",
                offset: 0,
                reason: format!("length {len} does not fit in memory"),
            },
        )
    })
}
