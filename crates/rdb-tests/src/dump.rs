use rdb_wire::checksum::{CHECKSUM_MIN_VERSION, Crc64Redis};
use rdb_wire::opcode;

/// Builds dump files byte by byte for tests and benchmarks.
///
/// The builder writes exactly what it is told: it does not check that the
/// sequence of calls makes a valid dump, so tests can produce the malformed
/// inputs they need.
///
/// ```
/// use rdb_tests::DumpBuilder;
///
/// let dump = DumpBuilder::new(12)
///     .select_db(0)
///     .string_object(b"greeting", b"hello")
///     .finish();
/// assert_eq!(&dump[..9], b"REDIS0012");
/// ```
#[derive(Clone, Debug)]
pub struct DumpBuilder {
    buf: Vec<u8>,
    version: u32,
}

impl DumpBuilder {
    /// Start a dump with a `REDIS` + four-digit version header.
    pub fn new(version: u32) -> Self {
        let mut buf = b"REDIS".to_vec();
        buf.extend_from_slice(format!("{version:04}").as_bytes());
        Self { buf, version }
    }

    /// Start from arbitrary leading bytes, e.g. a malformed header.
    pub fn raw_header(header: &[u8], version: u32) -> Self {
        Self {
            buf: header.to_vec(),
            version,
        }
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn byte(&mut self, byte: u8) -> &mut Self {
        self.buf.push(byte);
        self
    }

    // ── Opcodes ───────────────────────────────────────────────────────────────

    pub fn select_db(&mut self, db: u64) -> &mut Self {
        self.byte(opcode::SELECTDB).length(db)
    }

    pub fn resize_db(&mut self, db_size: u64, expires_size: u64) -> &mut Self {
        self.byte(opcode::RESIZEDB).length(db_size).length(expires_size)
    }

    pub fn aux(&mut self, key: &[u8], value: &[u8]) -> &mut Self {
        self.byte(opcode::AUX).string(key).string(value)
    }

    pub fn expire_ms(&mut self, at_ms: u64) -> &mut Self {
        self.byte(opcode::EXPIRETIME_MS).raw(&at_ms.to_le_bytes())
    }

    pub fn expire_secs(&mut self, at_secs: u32) -> &mut Self {
        self.byte(opcode::EXPIRETIME).raw(&at_secs.to_le_bytes())
    }

    /// LFU frequency through the `0xF9` opcode.
    pub fn freq(&mut self, freq: u8) -> &mut Self {
        self.byte(opcode::FREQ).byte(freq)
    }

    /// LRU idle time through the `0xF8` opcode.
    pub fn idle(&mut self, secs: u64) -> &mut Self {
        self.byte(opcode::IDLE).length(secs)
    }

    /// LFU frequency through `0xF4`, as version-12 writers with the legacy
    /// assignment emit it.
    pub fn legacy_freq(&mut self, freq: u8) -> &mut Self {
        self.byte(opcode::SLOT_INFO_OR_FREQ).byte(freq)
    }

    /// LRU idle time through `0xF5`: `0xC2` and two little-endian bytes,
    /// or `0xC8` and eight when the value does not fit.
    pub fn legacy_idle(&mut self, secs: u64) -> &mut Self {
        self.byte(opcode::FUNCTION_OR_IDLE);
        match u16::try_from(secs) {
            Ok(secs) => self.byte(0xC2).raw(&secs.to_le_bytes()),
            Err(_) => self.byte(0xC8).raw(&secs.to_le_bytes()),
        }
    }

    // ── Primitives ────────────────────────────────────────────────────────────

    /// A length prefix in the narrowest form.
    pub fn length(&mut self, len: u64) -> &mut Self {
        if len < 1 << 6 {
            self.byte(len as u8)
        } else if len < 1 << 14 {
            self.raw(&[0x40 | (len >> 8) as u8, len as u8])
        } else if let Ok(len) = u32::try_from(len) {
            self.byte(0x80).raw(&len.to_be_bytes())
        } else {
            self.byte(0x81).raw(&len.to_be_bytes())
        }
    }

    /// A plain length-prefixed string.
    pub fn string(&mut self, bytes: &[u8]) -> &mut Self {
        self.length(bytes.len() as u64).raw(bytes)
    }

    /// A string stored in the inline integer form (`0xC0`..`0xC2`).
    pub fn int_string(&mut self, value: i64) -> &mut Self {
        if let Ok(v) = i8::try_from(value) {
            self.byte(0xC0).raw(&v.to_le_bytes())
        } else if let Ok(v) = i16::try_from(value) {
            self.byte(0xC1).raw(&v.to_le_bytes())
        } else {
            let v = i32::try_from(value).expect("inline integers are at most 32 bits");
            self.byte(0xC2).raw(&v.to_le_bytes())
        }
    }

    /// An LZF-compressed string: `0xC3`, compressed length, original
    /// length, then the compressed bytes.
    pub fn lzf_string(&mut self, compressed: &[u8], original_len: u64) -> &mut Self {
        self.byte(0xC3)
            .length(compressed.len() as u64)
            .length(original_len)
            .raw(compressed)
    }

    /// Compress `original` with LZF and write it in the compressed form.
    ///
    /// # Panics
    ///
    /// If `original` does not compress.
    pub fn compressed_string(&mut self, original: &[u8]) -> &mut Self {
        let compressed = lzf::compress(original).expect("fixture data must be compressible");
        self.lzf_string(&compressed, original.len() as u64)
    }

    /// Score in the old text form: 1-byte length, 253/254/255 for
    /// NaN/+inf/-inf.
    pub fn double_string(&mut self, score: f64) -> &mut Self {
        if score.is_nan() {
            self.byte(253)
        } else if score == f64::INFINITY {
            self.byte(254)
        } else if score == f64::NEG_INFINITY {
            self.byte(255)
        } else {
            let text = score.to_string();
            self.byte(text.len() as u8).raw(text.as_bytes())
        }
    }

    pub fn binary_double(&mut self, score: f64) -> &mut Self {
        self.raw(&score.to_le_bytes())
    }

    pub fn u64_le(&mut self, value: u64) -> &mut Self {
        self.raw(&value.to_le_bytes())
    }

    /// A raw 16-byte stream ID.
    pub fn stream_id(&mut self, ms: u64, seq: u64) -> &mut Self {
        self.raw(&ms.to_be_bytes()).raw(&seq.to_be_bytes())
    }

    // ── Objects ───────────────────────────────────────────────────────────────

    /// Value-type tag followed by the key.
    pub fn object(&mut self, value_type: u8, key: &[u8]) -> &mut Self {
        self.byte(value_type).string(key)
    }

    pub fn string_object(&mut self, key: &[u8], value: &[u8]) -> &mut Self {
        self.object(0, key).string(value)
    }

    pub fn list_object(&mut self, key: &[u8], items: &[&[u8]]) -> &mut Self {
        self.object(1, key).length(items.len() as u64);
        for item in items {
            self.string(item);
        }
        self
    }

    pub fn hash_object(&mut self, key: &[u8], pairs: &[(&[u8], &[u8])]) -> &mut Self {
        self.object(4, key).length(pairs.len() as u64);
        for (field, value) in pairs {
            self.string(field).string(value);
        }
        self
    }

    // ── Output ────────────────────────────────────────────────────────────────

    /// Bytes written so far, without end marker or checksum.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append the end marker and, for version 5 and later, the CRC-64
    /// trailer over everything before it.
    pub fn finish(&mut self) -> Vec<u8> {
        self.byte(opcode::EOF);
        if self.version >= CHECKSUM_MIN_VERSION {
            let crc = Crc64Redis::checksum(&self.buf);
            self.u64_le(crc);
        }
        self.buf.clone()
    }

    /// Append the end marker and a caller-chosen trailer.
    pub fn finish_with_checksum(&mut self, checksum: u64) -> Vec<u8> {
        self.byte(opcode::EOF).u64_le(checksum);
        self.buf.clone()
    }
}
