use std::io::{ErrorKind, Read};

use crate::checksum::{CHECKSUM_SIZE, Checksum, NoChecksum};
use crate::error::WireError;

/// Reads larger than this are pulled through `Read::take` in chunks
/// instead of being allocated up front. A corrupt length prefix can claim
/// gigabytes; the allocation should only grow as real bytes arrive.
const EAGER_ALLOC_LIMIT: usize = 64 * 1024;

/// Forward-only reader over the raw dump bytes.
///
/// `ByteCursor` wraps any [`Read`] source and tracks how many bytes have
/// been consumed since the first header byte. Every consumed byte is fed
/// into the running [`Checksum`] except the trailer itself, which is read
/// through [`read_trailer`](Self::read_trailer).
///
/// ```text
///   position 0                                    position N
///   ├── header ── opcodes / objects ── 0xFF ──┤── trailer (8) ──┤
///   └──────────── fed to the checksum ────────┘
/// ```
///
/// The cursor never seeks; the format is decodable in one forward pass.
pub struct ByteCursor<R> {
    reader: R,
    position: u64,
    checksum: Box<dyn Checksum>,
}

impl<R: Read> ByteCursor<R> {
    /// Create a cursor that does not compute a checksum.
    pub fn new(reader: R) -> Self {
        Self::with_checksum(reader, Box::new(NoChecksum))
    }

    /// Create a cursor that feeds every consumed byte to `checksum`.
    pub fn with_checksum(reader: R, checksum: Box<dyn Checksum>) -> Self {
        Self {
            reader,
            position: 0,
            checksum,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Finalize the running checksum over everything consumed so far.
    pub fn finalize_checksum(&mut self) -> u64 {
        self.checksum.finalize()
    }

    /// Read a single byte.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the source is exhausted.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        let mut byte = [0u8; 1];
        self.fill(&mut byte)?;
        Ok(byte[0])
    }

    /// Read exactly `N` bytes into a fixed array.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes into a fresh vector.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than `len` bytes remain. The
    /// reported offset is where the field started.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        let start = self.position;
        if len <= EAGER_ALLOC_LIMIT {
            let mut buf = vec![0u8; len];
            self.fill(&mut buf)?;
            return Ok(buf);
        }

        let mut buf = Vec::with_capacity(EAGER_ALLOC_LIMIT);
        let read = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut buf)?;
        self.checksum.update(&buf);
        self.position += read as u64;

        if read < len {
            return Err(WireError::UnexpectedEof {
                offset: start,
                needed: len - read,
            });
        }
        Ok(buf)
    }

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_u32_le(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_u64_le(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read the 8-byte trailing checksum without feeding it to the
    /// running checksum.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the trailer is cut short.
    pub fn read_trailer(&mut self) -> Result<u64, WireError> {
        let mut buf = [0u8; CHECKSUM_SIZE];
        self.read_raw(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        self.read_raw(buf)?;
        self.checksum.update(buf);
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let start = self.position;
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.position += filled as u64;
                    return Err(WireError::UnexpectedEof {
                        offset: start,
                        needed: buf.len() - filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(WireError::Io(e)),
            }
        }
        self.position += filled as u64;
        Ok(())
    }
}
