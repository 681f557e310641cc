use std::io::Read;
use std::sync::Arc;

use rdb_types::RedisObject;

use crate::config::DecoderConfig;
use crate::decompression::{Decompressor, LzfDecompressor};
use crate::error::DecodeError;
use crate::streaming::ObjectStream;
use crate::summary::DecodeSummary;

/// What the callback wants after each object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// End the parse successfully without reading the rest of the dump.
    Stop,
}

/// Every object of an in-memory dump plus the parse summary.
///
/// ```text
/// ┌───────────────────────────────────────────────────────┐
/// │ DecodedDump                                           │
/// │   objects: Vec<RedisObject> ← dump order              │
/// │   summary: DecodeSummary    ← version, aux, checksums │
/// └───────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct DecodedDump {
    pub objects: Vec<RedisObject>,
    pub summary: DecodeSummary,
}

/// Dump decoder.
///
/// Holds only configuration and the decompressor; every parse call builds
/// its own state, so one decoder can serve any number of sources,
/// sequentially or from several threads.
///
/// Three entry points share one engine:
///
///   1. [`parse`](Self::parse): push each object into a callback, which can
///      stop early by returning [`Control::Stop`].
///   2. [`stream`](Self::stream): pull objects through an iterator.
///   3. [`decode`](Self::decode): collect a whole in-memory dump.
///
/// # Example
///
/// ```rust
/// use rdb_decoder::{Control, RdbDecoder};
///
/// let dump = rdb_tests::DumpBuilder::new(12)
///     .select_db(0)
///     .string_object(b"greeting", b"hello")
///     .finish();
///
/// let mut keys = Vec::new();
/// let summary = RdbDecoder::new()
///     .parse(&dump[..], |object| {
///         keys.push(object.key);
///         Control::Continue
///     })
///     .unwrap();
///
/// assert_eq!(keys, vec![b"greeting".to_vec()]);
/// assert_eq!(summary.objects, 1);
/// ```
#[derive(Clone)]
pub struct RdbDecoder {
    config: DecoderConfig,
    decompressor: Arc<dyn Decompressor>,
}

impl RdbDecoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            decompressor: Arc::new(LzfDecompressor),
        }
    }

    /// Replace the LZF implementation used for compressed strings.
    #[must_use]
    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode `reader` and hand each object to `callback` in dump order.
    ///
    /// Each object is complete, metadata included, when the callback sees
    /// it. Returning [`Control::Stop`] ends the parse with `Ok`; the
    /// checksum is then not verified and
    /// [`DecodeSummary::stopped_early`] is set.
    ///
    /// # Errors
    ///
    /// The first [`DecodeError`] met. Objects already delivered stand; the
    /// callback is never called after an error.
    pub fn parse<R, F>(&self, reader: R, mut callback: F) -> Result<DecodeSummary, DecodeError>
    where
        R: Read,
        F: FnMut(RedisObject) -> Control,
    {
        let mut stream = self.stream(reader);
        while let Some(object) = stream.next() {
            if callback(object?) == Control::Stop {
                stream.stop();
            }
        }
        Ok(stream.into_summary())
    }

    /// Decode `reader` lazily, one object per `next` call.
    pub fn stream<R: Read>(&self, reader: R) -> ObjectStream<R> {
        ObjectStream::new(reader, self.config.clone(), Arc::clone(&self.decompressor))
    }

    /// Decode a complete dump held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn decode(&self, dump: &[u8]) -> Result<DecodedDump, DecodeError> {
        let mut objects = Vec::new();
        let summary = self.parse(dump, |object| {
            objects.push(object);
            Control::Continue
        })?;
        Ok(DecodedDump { objects, summary })
    }
}

impl Default for RdbDecoder {
    fn default() -> Self {
        Self::new()
    }
}
