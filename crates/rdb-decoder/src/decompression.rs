//! LZF decompression behind a pluggable trait.
//!
//! The dump format compresses long strings with LZF. The decoder only
//! depends on [`Decompressor`]; [`LzfDecompressor`] is the default and
//! delegates to the `lzf` crate.

/// LZF cannot expand a byte of input into more than this many bytes of
/// output (a 3-byte back reference copies at most 264 bytes). A declared
/// size beyond that bound is corrupt and is rejected before allocating.
const MAX_EXPANSION: u64 = 90;

/// Why a block could not be decompressed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecompressFailure(pub String);

/// Expands one compressed string.
///
/// Implementations must return exactly `expected_len` bytes or fail. The
/// decoder checks the length again, so a misbehaving implementation still
/// surfaces as a decode error rather than a wrong value.
pub trait Decompressor: Send + Sync {
    /// # Errors
    ///
    /// [`DecompressFailure`] if `input` is not a valid block for
    /// `expected_len` bytes of output.
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, DecompressFailure>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LzfDecompressor;

impl Decompressor for LzfDecompressor {
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, DecompressFailure> {
        if expected_len == 0 {
            return if input.is_empty() {
                Ok(Vec::new())
            } else {
                Err(DecompressFailure("non-empty block for empty output".into()))
            };
        }

        let ceiling = (input.len() as u64).saturating_mul(MAX_EXPANSION);
        if expected_len as u64 > ceiling {
            return Err(DecompressFailure(format!(
                "{} compressed bytes cannot expand to {expected_len}",
                input.len()
            )));
        }

        lzf::decompress(input, expected_len).map_err(|e| DecompressFailure(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_run() {
        // Control byte 4 = literal run of 5 bytes.
        let out = LzfDecompressor.decompress(b"\x04hello", 5).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn back_reference() {
        // 'a' literal, then a long back reference copying 9 bytes from
        // distance 1.
        let out = LzfDecompressor
            .decompress(&[0x00, b'a', 0xE0, 0x00, 0x00], 10)
            .unwrap();
        assert_eq!(out, vec![b'a'; 10]);
    }

    #[test]
    fn round_trip_with_lzf_compress() {
        let original = b"abcabcabcabcabcabcabcabcabcabcabcabc".repeat(8);
        let compressed = lzf::compress(&original).unwrap();
        let out = LzfDecompressor
            .decompress(&compressed, original.len())
            .unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn output_too_small_fails() {
        assert!(LzfDecompressor.decompress(b"\x04hello", 3).is_err());
    }

    #[test]
    fn implausible_expansion_is_rejected_up_front() {
        let err = LzfDecompressor
            .decompress(b"\x00a", usize::MAX / 2)
            .unwrap_err();
        assert!(err.0.contains("cannot expand"));
    }

    #[test]
    fn empty_output() {
        assert!(LzfDecompressor.decompress(b"", 0).unwrap().is_empty());
        assert!(LzfDecompressor.decompress(b"\x00a", 0).is_err());
    }
}
