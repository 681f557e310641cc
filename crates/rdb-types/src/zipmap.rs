use crate::error::TypeError;

const CONTAINER: &str = "zipmap";
const END: u8 = 0xFF;
/// Length byte announcing a 4-byte LE length.
const LEN_WIDE: u8 = 0xFE;

/// Unpack a zipmap blob into field/value pairs.
///
/// ```text
/// ┌───────┬──────────────────────────────────────────────────────┬──────┐
/// │ zmlen │ klen │ key │ vlen │ free │ value │ free bytes  ...   │ 0xFF │
/// └───────┴──────────────────────────────────────────────────────┴──────┘
/// ```
///
/// Lengths are one byte below 254, otherwise `0xFE` plus a u32 LE. `zmlen`
/// is only a hint (254 and above mean "count them") and is not checked.
///
/// # Errors
///
/// [`TypeError::CorruptContainer`] if an entry overruns the blob or the
/// end marker is missing.
pub fn unpack(blob: &[u8]) -> Result<Vec<(&[u8], &[u8])>, TypeError> {
    if blob.is_empty() {
        return Err(TypeError::corrupt(CONTAINER, 0, "empty blob"));
    }

    let mut pairs = Vec::new();
    let mut pos = 1;
    loop {
        match blob.get(pos) {
            None => return Err(TypeError::corrupt(CONTAINER, pos, "missing end marker")),
            Some(&END) => break,
            Some(_) => {}
        }

        let key_len = read_len(blob, &mut pos)?;
        let key = take(blob, &mut pos, key_len)?;

        let value_len = read_len(blob, &mut pos)?;
        let free = usize::from(take(blob, &mut pos, 1)?[0]);
        let value = take(blob, &mut pos, value_len)?;
        take(blob, &mut pos, free)?;

        pairs.push((key, value));
    }

    if pos + 1 != blob.len() {
        return Err(TypeError::corrupt(CONTAINER, pos, "end marker before end of blob"));
    }
    Ok(pairs)
}

fn read_len(blob: &[u8], pos: &mut usize) -> Result<usize, TypeError> {
    let first = take(blob, pos, 1)?[0];
    match first {
        LEN_WIDE => {
            let raw = take(blob, pos, 4)?;
            Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
        }
        END => Err(TypeError::corrupt(CONTAINER, *pos - 1, "end marker inside entry")),
        len => Ok(usize::from(len)),
    }
}

fn take<'a>(blob: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], TypeError> {
    let start = *pos;
    let bytes = start
        .checked_add(len)
        .and_then(|end| blob.get(start..end))
        .ok_or_else(|| TypeError::corrupt(CONTAINER, start, "entry overruns blob"))?;
    *pos += len;
    Ok(bytes)
}
