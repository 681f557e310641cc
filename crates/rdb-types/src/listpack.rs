use crate::error::TypeError;
use crate::packed::PackedValue;

const CONTAINER: &str = "listpack";

/// Header: total bytes (u32 LE) + element count (u16 LE).
const HEADER_SIZE: usize = 6;
const EOF: u8 = 0xFF;
/// Element count value meaning "too many to count, walk the entries".
const UNKNOWN_COUNT: u16 = u16::MAX;

/// Unpack a listpack blob into its elements, in order.
///
/// ```text
/// ┌────────────┬───────────┬─────────────────────────────┬──────┐
/// │ total (4)  │ count (2) │ entry: enc+data │ backlen   │ 0xFF │
/// └────────────┴───────────┴─────────────────────────────┴──────┘
/// ```
///
/// Entry encodings, selected by the first byte:
///
/// ```text
/// ┌──────────────┬───────────────────────────────────────┐
/// │ 0xxxxxxx     │ 7-bit unsigned int                    │
/// │ 10xxxxxx     │ string, 6-bit length                  │
/// │ 110xxxxx +1  │ 13-bit signed int                     │
/// │ 1110xxxx +1  │ string, 12-bit length                 │
/// │ 0xF0 +4      │ string, 32-bit LE length              │
/// │ 0xF1..0xF4   │ 16 / 24 / 32 / 64-bit LE signed int   │
/// └──────────────┴───────────────────────────────────────┘
/// ```
///
/// # Errors
///
/// [`TypeError::CorruptContainer`] if the size fields disagree with the
/// blob, an entry overruns it, or an encoding byte is unassigned.
pub fn unpack(blob: &[u8]) -> Result<Vec<PackedValue<'_>>, TypeError> {
    if blob.len() < HEADER_SIZE + 1 {
        return Err(TypeError::corrupt(CONTAINER, 0, "blob shorter than header"));
    }

    let total = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    if total != blob.len() {
        return Err(TypeError::corrupt(
            CONTAINER,
            0,
            format!("header claims {total} bytes, blob has {}", blob.len()),
        ));
    }
    let declared = u16::from_le_bytes([blob[4], blob[5]]);

    let mut entries = Vec::with_capacity(usize::from(declared.min(1024)));
    let mut pos = HEADER_SIZE;
    loop {
        let Some(&first) = blob.get(pos) else {
            return Err(TypeError::corrupt(CONTAINER, pos, "missing terminator"));
        };
        if first == EOF {
            break;
        }

        let (value, encoded_len) = decode_entry(blob, pos)?;
        entries.push(value);
        pos += encoded_len + backlen_size(encoded_len);
    }

    if pos + 1 != blob.len() {
        return Err(TypeError::corrupt(CONTAINER, pos, "terminator before end of blob"));
    }
    if declared != UNKNOWN_COUNT && usize::from(declared) != entries.len() {
        return Err(TypeError::corrupt(
            CONTAINER,
            0,
            format!("header claims {declared} entries, found {}", entries.len()),
        ));
    }

    Ok(entries)
}

/// Decode the entry at `pos`. Returns the value and the size of the
/// encoding + data part (the backlen is not included).
fn decode_entry(blob: &[u8], pos: usize) -> Result<(PackedValue<'_>, usize), TypeError> {
    let first = blob[pos];

    if first & 0x80 == 0 {
        return Ok((PackedValue::Int(i64::from(first & 0x7F)), 1));
    }
    if first & 0xC0 == 0x80 {
        let len = usize::from(first & 0x3F);
        return Ok((PackedValue::Bytes(slice(blob, pos + 1, len)?), 1 + len));
    }
    if first & 0xE0 == 0xC0 {
        let next = slice(blob, pos + 1, 1)?[0];
        let raw = (i64::from(first & 0x1F) << 8) | i64::from(next);
        let value = if raw >= 1 << 12 { raw - (1 << 13) } else { raw };
        return Ok((PackedValue::Int(value), 2));
    }
    if first & 0xF0 == 0xE0 {
        let next = slice(blob, pos + 1, 1)?[0];
        let len = (usize::from(first & 0x0F) << 8) | usize::from(next);
        return Ok((PackedValue::Bytes(slice(blob, pos + 2, len)?), 2 + len));
    }

    match first {
        0xF0 => {
            let raw = slice(blob, pos + 1, 4)?;
            let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
            Ok((PackedValue::Bytes(slice(blob, pos + 5, len)?), 5 + len))
        }
        0xF1 => {
            let raw = slice(blob, pos + 1, 2)?;
            Ok((PackedValue::Int(i64::from(i16::from_le_bytes([raw[0], raw[1]]))), 3))
        }
        0xF2 => {
            let raw = slice(blob, pos + 1, 3)?;
            let value = i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 8;
            Ok((PackedValue::Int(i64::from(value)), 4))
        }
        0xF3 => {
            let raw = slice(blob, pos + 1, 4)?;
            let value = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            Ok((PackedValue::Int(i64::from(value)), 5))
        }
        0xF4 => {
            let raw = slice(blob, pos + 1, 8)?;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(raw);
            Ok((PackedValue::Int(i64::from_le_bytes(bytes)), 9))
        }
        other => Err(TypeError::corrupt(
            CONTAINER,
            pos,
            format!("unassigned entry encoding {other:#04X}"),
        )),
    }
}

/// Number of bytes used by the back-length that trails an entry whose
/// encoding + data part is `len` bytes.
pub fn backlen_size(len: usize) -> usize {
    match len {
        0..=127 => 1,
        128..16_383 => 2,
        16_383..2_097_151 => 3,
        2_097_151..268_435_455 => 4,
        _ => 5,
    }
}

fn slice(blob: &[u8], start: usize, len: usize) -> Result<&[u8], TypeError> {
    start
        .checked_add(len)
        .and_then(|end| blob.get(start..end))
        .ok_or_else(|| TypeError::corrupt(CONTAINER, start, "entry overruns blob"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a listpack from short strings (< 64 bytes) and small ints (< 128).
    fn build(entries: &[PackedValue<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for entry in entries {
            match *entry {
                PackedValue::Bytes(b) => {
                    body.push(0x80 | u8::try_from(b.len()).unwrap());
                    body.extend_from_slice(b);
                    body.push(u8::try_from(b.len() + 1).unwrap());
                }
                PackedValue::Int(v) => {
                    body.push(u8::try_from(v).unwrap());
                    body.push(1);
                }
            }
        }
        let total = u32::try_from(HEADER_SIZE + body.len() + 1).unwrap();
        let mut blob = total.to_le_bytes().to_vec();
        blob.extend_from_slice(&u16::try_from(entries.len()).unwrap().to_le_bytes());
        blob.extend_from_slice(&body);
        blob.push(EOF);
        blob
    }

    #[test]
    fn strings_and_small_ints() {
        let entries = [
            PackedValue::Bytes(b"field"),
            PackedValue::Int(7),
            PackedValue::Bytes(b""),
        ];
        let blob = build(&entries);
        assert_eq!(unpack(&blob).unwrap(), entries.to_vec());
    }

    #[test]
    fn empty_listpack() {
        let blob = build(&[]);
        assert!(unpack(&blob).unwrap().is_empty());
    }

    #[test]
    fn thirteen_bit_signed() {
        // 0xDF 0xFF = raw 0x1FFF → -1; backlen 2.
        let blob = [0x0A, 0, 0, 0, 0x01, 0x00, 0xDF, 0xFF, 0x02, 0xFF];
        assert_eq!(unpack(&blob).unwrap(), vec![PackedValue::Int(-1)]);
    }

    #[test]
    fn wide_ints() {
        let mut body = vec![0xF1];
        body.extend_from_slice(&(-300i16).to_le_bytes());
        body.push(3);
        body.extend_from_slice(&[0xF2, 0x00, 0x00, 0x80, 4]); // i24 min
        body.push(0xF4);
        body.extend_from_slice(&i64::MAX.to_le_bytes());
        body.push(9);

        let mut blob = u32::try_from(HEADER_SIZE + body.len() + 1)
            .unwrap()
            .to_le_bytes()
            .to_vec();
        blob.extend_from_slice(&3u16.to_le_bytes());
        blob.extend_from_slice(&body);
        blob.push(EOF);

        assert_eq!(
            unpack(&blob).unwrap(),
            vec![
                PackedValue::Int(-300),
                PackedValue::Int(-8_388_608),
                PackedValue::Int(i64::MAX),
            ]
        );
    }

    #[test]
    fn reject_size_mismatch() {
        let mut blob = build(&[PackedValue::Bytes(b"a")]);
        blob[0] += 1;
        assert!(matches!(
            unpack(&blob),
            Err(TypeError::CorruptContainer { offset: 0, .. })
        ));
    }

    #[test]
    fn reject_count_mismatch() {
        let mut blob = build(&[PackedValue::Bytes(b"a")]);
        blob[4] = 2;
        assert!(unpack(&blob).is_err());
    }

    #[test]
    fn unknown_count_is_accepted() {
        let mut blob = build(&[PackedValue::Bytes(b"a"), PackedValue::Int(1)]);
        blob[4] = 0xFF;
        blob[5] = 0xFF;
        assert_eq!(unpack(&blob).unwrap().len(), 2);
    }

    #[test]
    fn reject_overrun() {
        // String claims 10 bytes but the blob ends first.
        let blob = [0x0A, 0, 0, 0, 0x01, 0x00, 0x8A, b'x', 0x02, 0xFF];
        assert!(matches!(
            unpack(&blob),
            Err(TypeError::CorruptContainer { .. })
        ));
    }

    #[test]
    fn reject_unassigned_encoding() {
        let blob = [0x09, 0, 0, 0, 0x01, 0x00, 0xF7, 0x01, 0xFF];
        assert!(matches!(
            unpack(&blob),
            Err(TypeError::CorruptContainer { offset: 6, .. })
        ));
    }

    #[test]
    fn backlen_boundaries() {
        assert_eq!(backlen_size(1), 1);
        assert_eq!(backlen_size(127), 1);
        assert_eq!(backlen_size(128), 2);
        assert_eq!(backlen_size(16_382), 2);
        assert_eq!(backlen_size(16_383), 3);
    }
}
