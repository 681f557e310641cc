//! Encoders for the compact container blobs, used to build fixtures.
//!
//! Each function picks the smallest encoding a real writer would pick, so
//! the blobs exercise the same code paths as dumps written by the server.

/// One element to pack into a ziplist or listpack.
#[derive(Clone, Copy, Debug)]
pub enum Packed<'a> {
    Str(&'a [u8]),
    Int(i64),
}

impl<'a> From<&'a str> for Packed<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s.as_bytes())
    }
}

impl From<i64> for Packed<'_> {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

// ── Listpack ──────────────────────────────────────────────────────────────────

/// Encode a listpack: 6-byte header, entries with back-lengths, `0xFF`.
pub fn listpack(entries: &[Packed<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for entry in entries {
        let encoded = listpack_entry(*entry);
        let backlen = listpack_backlen(encoded.len());
        body.extend_from_slice(&encoded);
        body.extend_from_slice(&backlen);
    }

    let total = u32::try_from(6 + body.len() + 1).expect("listpack fits in u32");
    let count = u16::try_from(entries.len()).unwrap_or(u16::MAX);
    let mut blob = Vec::with_capacity(total as usize);
    blob.extend_from_slice(&total.to_le_bytes());
    blob.extend_from_slice(&count.to_le_bytes());
    blob.extend_from_slice(&body);
    blob.push(0xFF);
    blob
}

fn listpack_entry(entry: Packed<'_>) -> Vec<u8> {
    match entry {
        Packed::Int(v @ 0..=127) => vec![v as u8],
        Packed::Int(v @ -4096..=4095) => {
            let raw = (v as u16) & 0x1FFF;
            vec![0xC0 | (raw >> 8) as u8, raw as u8]
        }
        Packed::Int(v) if i16::try_from(v).is_ok() => {
            let mut out = vec![0xF1];
            out.extend_from_slice(&(v as i16).to_le_bytes());
            out
        }
        Packed::Int(v) if (-(1 << 23)..(1 << 23)).contains(&v) => {
            let mut out = vec![0xF2];
            out.extend_from_slice(&(v as i32).to_le_bytes()[..3]);
            out
        }
        Packed::Int(v) if i32::try_from(v).is_ok() => {
            let mut out = vec![0xF3];
            out.extend_from_slice(&(v as i32).to_le_bytes());
            out
        }
        Packed::Int(v) => {
            let mut out = vec![0xF4];
            out.extend_from_slice(&v.to_le_bytes());
            out
        }
        Packed::Str(s) if s.len() < 64 => {
            let mut out = vec![0x80 | s.len() as u8];
            out.extend_from_slice(s);
            out
        }
        Packed::Str(s) if s.len() < 4096 => {
            let mut out = vec![0xE0 | (s.len() >> 8) as u8, s.len() as u8];
            out.extend_from_slice(s);
            out
        }
        Packed::Str(s) => {
            let mut out = vec![0xF0];
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s);
            out
        }
    }
}

fn listpack_backlen(len: usize) -> Vec<u8> {
    let mut groups = Vec::new();
    let mut rest = len;
    loop {
        groups.push((rest & 0x7F) as u8);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    // Most significant group first; all groups after it carry the
    // continuation bit.
    groups.reverse();
    for group in groups.iter_mut().skip(1) {
        *group |= 0x80;
    }
    groups
}

// ── Ziplist ───────────────────────────────────────────────────────────────────

/// Encode a ziplist: 10-byte header, entries with prev-lengths, `0xFF`.
pub fn ziplist(entries: &[Packed<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut prev_len = 0usize;
    let mut tail = 10usize;

    for entry in entries {
        tail = 10 + body.len();
        let mut encoded = ziplist_prevlen(prev_len);
        encoded.extend_from_slice(&ziplist_entry(*entry));
        prev_len = encoded.len();
        body.extend_from_slice(&encoded);
    }

    let total = u32::try_from(10 + body.len() + 1).expect("ziplist fits in u32");
    let count = u16::try_from(entries.len()).unwrap_or(u16::MAX);
    let mut blob = Vec::with_capacity(total as usize);
    blob.extend_from_slice(&total.to_le_bytes());
    blob.extend_from_slice(&(tail as u32).to_le_bytes());
    blob.extend_from_slice(&count.to_le_bytes());
    blob.extend_from_slice(&body);
    blob.push(0xFF);
    blob
}

fn ziplist_prevlen(len: usize) -> Vec<u8> {
    if len < 254 {
        vec![len as u8]
    } else {
        let mut out = vec![0xFE];
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out
    }
}

fn ziplist_entry(entry: Packed<'_>) -> Vec<u8> {
    match entry {
        Packed::Int(v @ 0..=12) => vec![0xF1 + v as u8],
        Packed::Int(v) if i8::try_from(v).is_ok() => vec![0xFE, v as i8 as u8],
        Packed::Int(v) if i16::try_from(v).is_ok() => {
            let mut out = vec![0xC0];
            out.extend_from_slice(&(v as i16).to_le_bytes());
            out
        }
        Packed::Int(v) if (-(1 << 23)..(1 << 23)).contains(&v) => {
            let mut out = vec![0xF0];
            out.extend_from_slice(&(v as i32).to_le_bytes()[..3]);
            out
        }
        Packed::Int(v) if i32::try_from(v).is_ok() => {
            let mut out = vec![0xD0];
            out.extend_from_slice(&(v as i32).to_le_bytes());
            out
        }
        Packed::Int(v) => {
            let mut out = vec![0xE0];
            out.extend_from_slice(&v.to_le_bytes());
            out
        }
        Packed::Str(s) if s.len() < 64 => {
            let mut out = vec![s.len() as u8];
            out.extend_from_slice(s);
            out
        }
        Packed::Str(s) if s.len() < 16_384 => {
            let mut out = vec![0x40 | (s.len() >> 8) as u8, s.len() as u8];
            out.extend_from_slice(s);
            out
        }
        Packed::Str(s) => {
            let mut out = vec![0x80];
            out.extend_from_slice(&(s.len() as u32).to_be_bytes());
            out.extend_from_slice(s);
            out
        }
    }
}

// ── Intset / zipmap ───────────────────────────────────────────────────────────

/// Encode an intset with the narrowest width that holds every value.
/// Values are sorted, as the server keeps them.
pub fn intset(values: &[i64]) -> Vec<u8> {
    let width: u32 = if values.iter().all(|v| i16::try_from(*v).is_ok()) {
        2
    } else if values.iter().all(|v| i32::try_from(*v).is_ok()) {
        4
    } else {
        8
    };
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut blob = width.to_le_bytes().to_vec();
    blob.extend_from_slice(&(sorted.len() as u32).to_le_bytes());
    for v in sorted {
        blob.extend_from_slice(&v.to_le_bytes()[..width as usize]);
    }
    blob
}

/// Encode a zipmap with no free space after values.
pub fn zipmap(pairs: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut blob = vec![u8::try_from(pairs.len()).unwrap_or(254).min(254)];
    for (key, value) in pairs {
        zipmap_len(&mut blob, key.len());
        blob.extend_from_slice(key);
        zipmap_len(&mut blob, value.len());
        blob.push(0);
        blob.extend_from_slice(value);
    }
    blob.push(0xFF);
    blob
}

fn zipmap_len(out: &mut Vec<u8>, len: usize) {
    if len < 254 {
        out.push(len as u8);
    } else {
        out.push(0xFE);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
}
