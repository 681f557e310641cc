use crate::error::TypeError;

const CONTAINER: &str = "intset";
const HEADER_SIZE: usize = 8;

/// Unpack an intset blob into its integers, in stored (ascending) order.
///
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────────────┐
/// │ width u32 LE │ count u32 LE │ count × width-byte LE ints   │
/// └──────────────┴──────────────┴──────────────────────────────┘
/// ```
///
/// `width` is 2, 4 or 8.
///
/// # Errors
///
/// [`TypeError::CorruptContainer`] for an unknown width or a blob whose
/// size is not exactly `8 + width * count`.
pub fn unpack(blob: &[u8]) -> Result<Vec<i64>, TypeError> {
    if blob.len() < HEADER_SIZE {
        return Err(TypeError::corrupt(CONTAINER, 0, "blob shorter than header"));
    }

    let width = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    if !matches!(width, 2 | 4 | 8) {
        return Err(TypeError::corrupt(
            CONTAINER,
            0,
            format!("unsupported integer width {width}"),
        ));
    }
    let count = u32::from_le_bytes([blob[4], blob[5], blob[6], blob[7]]) as usize;

    let body = &blob[HEADER_SIZE..];
    if count.checked_mul(width) != Some(body.len()) {
        return Err(TypeError::corrupt(
            CONTAINER,
            4,
            format!("{count} × {width}-byte ints do not fill {} bytes", body.len()),
        ));
    }

    let decode: fn(&[u8]) -> i64 = match width {
        2 => |c| i64::from(i16::from_le_bytes([c[0], c[1]])),
        4 => |c| i64::from(i32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        _ => |c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]),
    };
    Ok(body.chunks_exact(width).map(decode).collect())
}
