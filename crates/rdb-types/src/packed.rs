use crate::error::TypeError;

/// One element of a ziplist or listpack.
///
/// Compact containers store small integers in binary form instead of as
/// text. The logical value is always the byte string, so integer elements
/// convert back to their decimal form when materialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackedValue<'a> {
    Bytes(&'a [u8]),
    Int(i64),
}

impl PackedValue<'_> {
    /// Materialize the element as the byte string it represents.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b.to_vec(),
            Self::Int(v) => v.to_string().into_bytes(),
        }
    }

    /// Interpret the element as an integer (stream metadata fields).
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            Self::Bytes(b) => std::str::from_utf8(b).ok()?.parse().ok(),
        }
    }

    /// Interpret the element as a sorted-set score.
    ///
    /// # Errors
    ///
    /// [`TypeError::InvalidScore`] if a string element is not a float.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_score(self) -> Result<f64, TypeError> {
        match self {
            Self::Int(v) => Ok(v as f64),
            Self::Bytes(b) => parse_score(b),
        }
    }
}

/// Parse a textual score, accepting the spellings the server writes for
/// infinities.
///
/// # Errors
///
/// [`TypeError::InvalidScore`] if `text` is not a float.
pub fn parse_score(text: &[u8]) -> Result<f64, TypeError> {
    let invalid = || TypeError::InvalidScore {
        text: String::from_utf8_lossy(text).into_owned(),
    };
    let s = std::str::from_utf8(text).map_err(|_| invalid())?;
    match s {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => s.parse::<f64>().map_err(|_| invalid()),
    }
}
