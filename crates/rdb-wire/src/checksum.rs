use crc::{CRC_64_REDIS, Crc, Digest};

/// Size of the trailing checksum in bytes.
pub const CHECKSUM_SIZE: usize = 8;

/// First format version that appends a checksum after the end marker.
pub const CHECKSUM_MIN_VERSION: u32 = 5;

/// A running checksum fed with every byte the cursor consumes.
///
/// The dump format fixes the algorithm (CRC-64/Jones), but the cursor only
/// sees this trait so tests can plug in a trivial function and callers that
/// skip verification can avoid the cost entirely with [`NoChecksum`].
pub trait Checksum: Send {
    /// Feed the next chunk of consumed bytes.
    fn update(&mut self, bytes: &[u8]);

    /// Return the checksum of everything fed so far.
    ///
    /// Called once, after the end marker. Later calls may return `0`.
    fn finalize(&mut self) -> u64;
}

static CRC64_REDIS: Crc<u64> = Crc::<u64>::new(&CRC_64_REDIS);

/// CRC-64 with the Jones polynomial, reflected, zero init, as written by
/// the key-value store after the end-of-file opcode.
pub struct Crc64Redis {
    digest: Option<Digest<'static, u64>>,
}

impl Crc64Redis {
    pub fn new() -> Self {
        Self {
            digest: Some(CRC64_REDIS.digest()),
        }
    }

    /// One-shot checksum of a complete buffer.
    pub fn checksum(bytes: &[u8]) -> u64 {
        CRC64_REDIS.checksum(bytes)
    }
}

impl Default for Crc64Redis {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Crc64Redis {
    fn update(&mut self, bytes: &[u8]) {
        if let Some(digest) = self.digest.as_mut() {
            digest.update(bytes);
        }
    }

    fn finalize(&mut self) -> u64 {
        self.digest.take().map_or(0, |digest| digest.finalize())
    }
}

/// Checksum that ignores its input. Used when verification is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoChecksum;

impl Checksum for NoChecksum {
    fn update(&mut self, _bytes: &[u8]) {}

    fn finalize(&mut self) -> u64 {
        0
    }
}
