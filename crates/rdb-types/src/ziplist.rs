use crate::error::TypeError;
use crate::packed::PackedValue;

const CONTAINER: &str = "ziplist";

/// zlbytes (u32 LE) + zltail (u32 LE) + zllen (u16 LE).
const HEADER_SIZE: usize = 10;
const END: u8 = 0xFF;
/// Previous-entry length byte announcing a 4-byte length.
const PREVLEN_WIDE: u8 = 0xFE;
const UNKNOWN_COUNT: u16 = u16::MAX;

// Integer encodings (the byte after prevlen).
const INT16: u8 = 0xC0;
const INT32: u8 = 0xD0;
const INT64: u8 = 0xE0;
const INT24: u8 = 0xF0;
const INT8: u8 = 0xFE;

/// Unpack a ziplist blob into its elements, in order.
///
/// ```text
/// ┌──────────┬──────────┬─────────┬──────────────────────────────┬──────┐
/// │ zlbytes  │ zltail   │ zllen   │ entry: prevlen │ enc │ data  │ 0xFF │
/// │ u32 LE   │ u32 LE   │ u16 LE  │ 1 or 5 bytes                 │      │
/// └──────────┴──────────┴─────────┴──────────────────────────────┴──────┘
/// ```
///
/// Encoding byte:
///
/// ```text
/// ┌──────────────────┬────────────────────────────────────┐
/// │ 00pppppp         │ string, 6-bit length               │
/// │ 01pppppp +1      │ string, 14-bit BE length           │
/// │ 0x80 +4          │ string, 32-bit BE length           │
/// │ 0xC0 / 0xD0 / 0xE0 │ int16 / int32 / int64 LE         │
/// │ 0xF0             │ int24 LE                           │
/// │ 0xFE             │ int8                               │
/// │ 0xF1..=0xFD      │ immediate 0..=12                   │
/// └──────────────────┴────────────────────────────────────┘
/// ```
///
/// # Errors
///
/// [`TypeError::CorruptContainer`] if the header disagrees with the blob,
/// an entry overruns it, or an encoding byte is unassigned.
pub fn unpack(blob: &[u8]) -> Result<Vec<PackedValue<'_>>, TypeError> {
    if blob.len() < HEADER_SIZE + 1 {
        return Err(TypeError::corrupt(CONTAINER, 0, "blob shorter than header"));
    }

    let zlbytes = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    if zlbytes != blob.len() {
        return Err(TypeError::corrupt(
            CONTAINER,
            0,
            format!("header claims {zlbytes} bytes, blob has {}", blob.len()),
        ));
    }
    let zltail = u32::from_le_bytes([blob[4], blob[5], blob[6], blob[7]]) as usize;
    let declared = u16::from_le_bytes([blob[8], blob[9]]);

    let mut entries = Vec::with_capacity(usize::from(declared.min(1024)));
    let mut pos = HEADER_SIZE;
    let mut last_entry = HEADER_SIZE;
    loop {
        let Some(&first) = blob.get(pos) else {
            return Err(TypeError::corrupt(CONTAINER, pos, "missing end marker"));
        };
        if first == END {
            break;
        }

        last_entry = pos;
        pos += if first == PREVLEN_WIDE { 5 } else { 1 };
        let (value, consumed) = decode_entry(blob, pos)?;
        entries.push(value);
        pos += consumed;
    }

    if pos + 1 != blob.len() {
        return Err(TypeError::corrupt(CONTAINER, pos, "end marker before end of blob"));
    }
    if zltail != last_entry {
        return Err(TypeError::corrupt(
            CONTAINER,
            4,
            format!("tail offset {zltail} does not match last entry at {last_entry}"),
        ));
    }
    if declared != UNKNOWN_COUNT && usize::from(declared) != entries.len() {
        return Err(TypeError::corrupt(
            CONTAINER,
            8,
            format!("header claims {declared} entries, found {}", entries.len()),
        ));
    }

    Ok(entries)
}

/// Decode the encoding and data at `pos`. Returns the value and the bytes
/// consumed.
fn decode_entry(blob: &[u8], pos: usize) -> Result<(PackedValue<'_>, usize), TypeError> {
    let enc = slice(blob, pos, 1)?[0];

    match enc >> 6 {
        0b00 => {
            let len = usize::from(enc & 0x3F);
            return Ok((PackedValue::Bytes(slice(blob, pos + 1, len)?), 1 + len));
        }
        0b01 => {
            let next = slice(blob, pos + 1, 1)?[0];
            let len = (usize::from(enc & 0x3F) << 8) | usize::from(next);
            return Ok((PackedValue::Bytes(slice(blob, pos + 2, len)?), 2 + len));
        }
        0b10 if enc == 0x80 => {
            let raw = slice(blob, pos + 1, 4)?;
            let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
            return Ok((PackedValue::Bytes(slice(blob, pos + 5, len)?), 5 + len));
        }
        _ => {}
    }

    let (value, width) = match enc {
        INT8 => (i64::from(i8::from_le_bytes([slice(blob, pos + 1, 1)?[0]])), 1),
        INT16 => {
            let raw = slice(blob, pos + 1, 2)?;
            (i64::from(i16::from_le_bytes([raw[0], raw[1]])), 2)
        }
        INT24 => {
            let raw = slice(blob, pos + 1, 3)?;
            (i64::from(i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 8), 3)
        }
        INT32 => {
            let raw = slice(blob, pos + 1, 4)?;
            (i64::from(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])), 4)
        }
        INT64 => {
            let raw = slice(blob, pos + 1, 8)?;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(raw);
            (i64::from_le_bytes(bytes), 8)
        }
        0xF1..=0xFD => (i64::from(enc & 0x0F) - 1, 0),
        other => {
            return Err(TypeError::corrupt(
                CONTAINER,
                pos,
                format!("unassigned entry encoding {other:#04X}"),
            ));
        }
    };
    Ok((PackedValue::Int(value), 1 + width))
}

fn slice(blob: &[u8], start: usize, len: usize) -> Result<&[u8], TypeError> {
    start
        .checked_add(len)
        .and_then(|end| blob.get(start..end))
        .ok_or_else(|| TypeError::corrupt(CONTAINER, start, "entry overruns blob"))
}
