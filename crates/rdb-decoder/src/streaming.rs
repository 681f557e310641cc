use std::io::Read;
use std::sync::Arc;

use rdb_types::{RedisObject, ValueType};
use rdb_wire::checksum::CHECKSUM_MIN_VERSION;
use rdb_wire::{ByteCursor, Checksum, Crc64Redis, LengthValue, NoChecksum, RdbHeader};
use tracing::{debug, trace};

use crate::config::{DecoderConfig, Opcode};
use crate::decompression::Decompressor;
use crate::error::DecodeError;
use crate::metadata::MetadataAccumulator;
use crate::object_reader::ObjectReader;
use crate::string_reader::StringReader;
use crate::summary::{DecodeSummary, ResizeHint};

/// Internal state machine of the engine.
///
/// ```text
///   AwaitingHeader → AwaitingOpcode ⇄ DecodingObject
///                          │                 │
///                          └──→ Terminated ←─┘
/// ```
///
/// `AwaitingOpcode` loops over metadata and bookkeeping opcodes until it
/// reads a byte that is not an opcode for this dump's version. That byte is
/// the value-type tag of the next object. Any error, the end marker, or a
/// stop request moves to `Terminated`, which is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    AwaitingHeader,
    AwaitingOpcode,
    DecodingObject { tag: u8, offset: u64 },
    Terminated,
}

/// Pull-based decoder: yields one [`RedisObject`] per call to `next`.
///
/// Reads from any [`Read`] source in a single forward pass, holding at most
/// one object in memory. Created by
/// [`RdbDecoder::stream`](crate::RdbDecoder::stream).
///
/// The iterator yields `Ok` for every object in dump order and ends after
/// the end marker has been read and the checksum verified. On a decode
/// error it yields that error once and then ends.
///
/// # Example
///
/// ```rust
/// use rdb_decoder::RdbDecoder;
///
/// let dump = rdb_tests::DumpBuilder::new(12)
///     .string_object(b"k", b"v")
///     .finish();
///
/// let mut stream = RdbDecoder::new().stream(&dump[..]);
/// for object in &mut stream {
///     let object = object.unwrap();
///     assert_eq!(object.key, b"k");
/// }
/// assert_eq!(stream.summary().objects, 1);
/// ```
pub struct ObjectStream<R> {
    cursor: ByteCursor<R>,
    config: DecoderConfig,
    decompressor: Arc<dyn Decompressor>,
    state: EngineState,
    /// Database of the objects that follow; 0 until a select opcode.
    db: u64,
    metadata: MetadataAccumulator,
    summary: DecodeSummary,
}

impl<R: Read> ObjectStream<R> {
    pub(crate) fn new(reader: R, config: DecoderConfig, decompressor: Arc<dyn Decompressor>) -> Self {
        let checksum: Box<dyn Checksum> = if config.verify_checksum {
            Box::new(Crc64Redis::new())
        } else {
            Box::new(NoChecksum)
        };
        Self {
            cursor: ByteCursor::with_checksum(reader, checksum),
            config,
            decompressor,
            state: EngineState::AwaitingHeader,
            db: 0,
            metadata: MetadataAccumulator::new(),
            summary: DecodeSummary::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bookkeeping gathered so far. Complete once the iterator has ended
    /// without an error.
    pub fn summary(&self) -> &DecodeSummary {
        &self.summary
    }

    pub fn into_summary(self) -> DecodeSummary {
        self.summary
    }

    /// Stop before the end marker. Nothing further is read and the checksum
    /// is not verified.
    pub fn stop(&mut self) {
        if self.state != EngineState::Terminated {
            debug!(
                objects = self.summary.objects,
                offset = self.cursor.position(),
                "decoding stopped by consumer"
            );
            self.summary.stopped_early = true;
            self.state = EngineState::Terminated;
        }
    }

    /// Run the state machine until it produces an object or terminates.
    fn advance(&mut self) -> Result<Option<RedisObject>, DecodeError> {
        loop {
            match self.state {
                EngineState::AwaitingHeader => self.read_header()?,
                EngineState::AwaitingOpcode => self.read_opcode()?,
                EngineState::DecodingObject { tag, offset } => {
                    return self.decode_object(tag, offset).map(Some);
                }
                EngineState::Terminated => return Ok(None),
            }
        }
    }

    fn read_header(&mut self) -> Result<(), DecodeError> {
        let header = RdbHeader::read_from(
            &mut self.cursor,
            self.config.min_version,
            self.config.max_version,
        )?;
        debug!(version = header.version, "header parsed");
        self.summary.version = header.version;
        self.state = EngineState::AwaitingOpcode;
        Ok(())
    }

    fn read_opcode(&mut self) -> Result<(), DecodeError> {
        let offset = self.cursor.position();
        let byte = self.cursor.read_u8()?;

        let Some(opcode) = self.config.opcodes.resolve(byte, self.summary.version) else {
            self.state = EngineState::DecodingObject { tag: byte, offset };
            return Ok(());
        };
        trace!(opcode = opcode.name(), offset, "opcode");

        if opcode.ends_key_scope() && !self.metadata.is_empty() {
            return Err(DecodeError::DanglingMetadata {
                offset,
                opcode: byte,
            });
        }

        match opcode {
            Opcode::Eof => self.finish()?,
            Opcode::SelectDb => {
                self.db = self.cursor.read_length()?;
                debug!(db = self.db, "database selected");
                self.summary.note_database(self.db);
            }
            Opcode::ResizeDb => {
                let db_size = self.cursor.read_length()?;
                let expires_size = self.cursor.read_length()?;
                debug!(db = self.db, db_size, expires_size, "resize hint");
                self.summary.resize_hints.push(ResizeHint {
                    db: self.db,
                    db_size,
                    expires_size,
                });
            }
            Opcode::ExpireTimeMs => {
                let at_ms = self.cursor.read_u64_le()?;
                self.metadata.set_expire_millis(at_ms);
            }
            Opcode::ExpireTime => {
                let at_secs = self.cursor.read_u32_le()?;
                self.metadata.set_expire_seconds(at_secs);
            }
            Opcode::Freq => {
                let frequency = self.cursor.read_u8()?;
                self.metadata.set_frequency(frequency);
            }
            Opcode::Idle => {
                let idle = self.read_idle()?;
                self.metadata.set_idle(idle);
            }
            Opcode::LegacyIdle => {
                let idle = self.cursor.read_width_prefixed()?;
                self.metadata.set_idle(idle);
            }
            Opcode::Aux => {
                let strings = StringReader::new(self.decompressor.as_ref());
                let key = strings.read_string(&mut self.cursor)?;
                let value = strings.read_string(&mut self.cursor)?;
                debug!(
                    key = %String::from_utf8_lossy(&key),
                    value = %String::from_utf8_lossy(&value),
                    "aux field"
                );
                self.summary.aux.push((key, value));
            }
            Opcode::SlotInfo => {
                for _ in 0..3 {
                    self.cursor.read_length()?;
                }
            }
            Opcode::Function => {
                StringReader::new(self.decompressor.as_ref()).read_string(&mut self.cursor)?;
            }
        }
        Ok(())
    }

    /// Idle time is a length, but some writers emit it as a non-negative
    /// inline integer.
    fn read_idle(&mut self) -> Result<u64, DecodeError> {
        let offset = self.cursor.position();
        match self.cursor.read_tagged_length()? {
            (_, LengthValue::Len(secs)) => Ok(secs),
            (byte, LengthValue::Integer(secs)) => {
                u64::try_from(secs).map_err(|_| DecodeError::InvalidLength { offset, byte })
            }
            (byte, LengthValue::Compressed { .. }) => Err(DecodeError::InvalidLength { offset, byte }),
        }
    }

    /// End marker: read and verify the trailer, then terminate.
    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.summary.version >= CHECKSUM_MIN_VERSION {
            let computed = self.cursor.finalize_checksum();
            let offset = self.cursor.position();
            let stored = self.cursor.read_trailer()?;
            self.summary.stored_checksum = Some(stored);

            if self.config.verify_checksum {
                self.summary.computed_checksum = Some(computed);
                if stored == 0 {
                    debug!("stored checksum is zero, verification skipped");
                } else if stored != computed {
                    return Err(DecodeError::ChecksumMismatch {
                        offset,
                        expected: stored,
                        computed,
                    });
                } else {
                    debug!(checksum = computed, "checksum verified");
                }
            }
        }

        debug!(
            objects = self.summary.objects,
            bytes = self.cursor.position(),
            "end of dump"
        );
        self.state = EngineState::Terminated;
        Ok(())
    }

    fn decode_object(&mut self, tag: u8, offset: u64) -> Result<RedisObject, DecodeError> {
        let encoding = ValueType::from_wire_id(tag);
        if !encoding.is_supported() {
            return Err(DecodeError::UnknownObjectType {
                offset,
                type_tag: tag,
            });
        }

        let strings = StringReader::new(self.decompressor.as_ref());
        let mut reader = ObjectReader::new(&mut self.cursor, strings);
        let key = reader.read_key()?;
        let payload = reader.read_payload(encoding, offset)?;

        let object = RedisObject {
            db: self.db,
            key,
            metadata: self.metadata.take_and_reset(),
            encoding,
            payload,
        };
        trace!(
            db = object.db,
            key = %object.key_str(),
            encoding = encoding.name(),
            offset,
            "object"
        );

        self.summary.objects += 1;
        self.state = EngineState::AwaitingOpcode;
        Ok(object)
    }
}

impl<R: Read> Iterator for ObjectStream<R> {
    type Item = Result<RedisObject, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(object) => object.map(Ok),
            Err(err) => {
                debug!(error = %err, "decoding failed");
                self.state = EngineState::Terminated;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rdb_tests::DumpBuilder;
    use rdb_types::{Expiry, ObjectMetadata, ObjectPayload};

    use super::*;
    use crate::config::OpcodeTable;
    use crate::decompression::LzfDecompressor;
    use crate::error::ErrorKind;

    fn stream(bytes: &[u8]) -> ObjectStream<&[u8]> {
        stream_with(bytes, DecoderConfig::default())
    }

    fn stream_with(bytes: &[u8], config: DecoderConfig) -> ObjectStream<&[u8]> {
        ObjectStream::new(bytes, config, Arc::new(LzfDecompressor))
    }

    #[test]
    fn yields_objects_then_ends() {
        let dump = DumpBuilder::new(12)
            .aux(b"redis-ver", b"7.2.4")
            .select_db(0)
            .resize_db(2, 0)
            .string_object(b"a", b"1")
            .string_object(b"b", b"2")
            .finish();

        let mut stream = stream(&dump);
        let keys: Vec<_> = stream
            .by_ref()
            .map(|o| o.unwrap_or_else(|e| panic!("decode failed: {e}")).key)
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(stream.state(), EngineState::Terminated);
        assert_eq!(stream.position(), dump.len() as u64);

        let summary = stream.into_summary();
        assert_eq!(summary.version, 12);
        assert_eq!(summary.objects, 2);
        assert_eq!(summary.databases, vec![0]);
        assert_eq!(summary.aux_value(b"redis-ver"), Some(&b"7.2.4"[..]));
        assert_eq!(
            summary.resize_hints,
            vec![ResizeHint {
                db: 0,
                db_size: 2,
                expires_size: 0
            }]
        );
        assert!(summary.checksum_verified());
    }

    #[test]
    fn metadata_applies_to_the_next_object_only() {
        let dump = DumpBuilder::new(9)
            .expire_ms(1_700_000_000_000)
            .freq(5)
            .idle(30)
            .string_object(b"with", b"meta")
            .string_object(b"without", b"meta")
            .finish();

        let objects: Vec<_> = stream(&dump).map(Result::unwrap).collect();
        assert_eq!(
            objects[0].metadata,
            ObjectMetadata {
                expire: Some(Expiry::Milliseconds(1_700_000_000_000)),
                frequency: Some(5),
                idle: Some(30),
            }
        );
        assert!(objects[1].metadata.is_empty());
    }

    #[test]
    fn select_db_applies_to_following_objects() {
        let dump = DumpBuilder::new(12)
            .string_object(b"zero", b"x")
            .select_db(3)
            .string_object(b"three", b"x")
            .finish();

        let dbs: Vec<_> = stream(&dump).map(|o| o.unwrap().db).collect();
        assert_eq!(dbs, vec![0, 3]);
    }

    #[test]
    fn error_is_yielded_once_then_stream_ends() {
        let dump = DumpBuilder::new(12)
            .string_object(b"ok", b"x")
            .byte(200)
            .finish();

        let mut stream = stream(&dump);
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownObjectType {
                offset: 15,
                type_tag: 200
            }
        ));
        assert!(stream.next().is_none());
        assert_eq!(stream.state(), EngineState::Terminated);
    }

    #[test]
    fn metadata_before_select_is_dangling() {
        let dump = DumpBuilder::new(12)
            .expire_ms(1)
            .select_db(1)
            .string_object(b"k", b"v")
            .finish();

        let err = stream(&dump).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DanglingMetadata {
                offset: 18,
                opcode: 0xFE
            }
        ));
    }

    #[test]
    fn metadata_before_eof_is_dangling() {
        let dump = DumpBuilder::new(12).freq(1).finish();
        let err = stream(&dump).next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DanglingMetadata);
        assert_eq!(err.offset(), Some(11));
    }

    #[test]
    fn opcode_newer_than_dump_is_a_type_tag() {
        // 0xF9 means FREQ only from version 9 on.
        let dump = DumpBuilder::new(8).freq(1).string_object(b"k", b"v").finish();
        let err = stream(&dump).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownObjectType {
                offset: 9,
                type_tag: 0xF9
            }
        ));
    }

    #[test]
    fn standard_table_skips_slot_info_and_functions() {
        let dump = DumpBuilder::new(12)
            .byte(0xF4)
            .length(7)
            .length(100)
            .length(5)
            .byte(0xF5)
            .string(b"#!lua name=lib")
            .string_object(b"k", b"v")
            .finish();

        let config = DecoderConfig {
            opcodes: OpcodeTable::standard(),
            ..DecoderConfig::default()
        };
        let objects: Vec<_> = stream_with(&dump, config).map(Result::unwrap).collect();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].metadata.is_empty());
    }

    #[test]
    fn idle_accepts_inline_integer() {
        let dump = DumpBuilder::new(12)
            .byte(0xF8)
            .raw(&[0xC1, 0xE8, 0x03])
            .string_object(b"k", b"v")
            .finish();
        let object = stream(&dump).next().unwrap().unwrap();
        assert_eq!(object.metadata.idle, Some(1000));
    }

    #[test]
    fn negative_idle_is_invalid() {
        let dump = DumpBuilder::new(12)
            .byte(0xF8)
            .raw(&[0xC0, 0xFF])
            .string_object(b"k", b"v")
            .finish();
        let err = stream(&dump).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidLength {
                offset: 10,
                byte: 0xC0
            }
        ));
    }

    #[test]
    fn legacy_idle_names_its_width() {
        let dump = DumpBuilder::new(12)
            .byte(0xF5)
            .raw(&[0xC2, 0xE8, 0x03])
            .string_object(b"k", b"v")
            .finish();
        let object = stream(&dump).next().unwrap().unwrap();
        assert_eq!(object.key, b"k");
        assert_eq!(object.metadata.idle, Some(1000));
    }

    #[test]
    fn legacy_idle_zero_width_is_invalid() {
        let dump = DumpBuilder::new(12)
            .byte(0xF5)
            .raw(&[0xC0, 0x01])
            .string_object(b"k", b"v")
            .finish();
        let err = stream(&dump).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidLength {
                offset: 10,
                byte: 0xC0
            }
        ));
    }

    #[test]
    fn checksum_mismatch_reports_trailer_offset() {
        let dump = DumpBuilder::new(12)
            .string_object(b"k", b"v")
            .finish_with_checksum(0xDEAD_BEEF);

        let mut stream = stream(&dump);
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ChecksumMismatch {
                offset: 15,
                expected: 0xDEAD_BEEF,
                ..
            }
        ));
    }

    #[test]
    fn verification_can_be_disabled() {
        let dump = DumpBuilder::new(12)
            .string_object(b"k", b"v")
            .finish_with_checksum(0xDEAD_BEEF);

        let config = DecoderConfig {
            verify_checksum: false,
            ..DecoderConfig::default()
        };
        let mut stream = stream_with(&dump, config);
        assert_eq!(stream.by_ref().filter(Result::is_ok).count(), 1);
        assert_eq!(stream.summary().stored_checksum, Some(0xDEAD_BEEF));
        assert_eq!(stream.summary().computed_checksum, None);
    }

    #[test]
    fn old_versions_have_no_trailer() {
        let dump = DumpBuilder::new(4).string_object(b"k", b"v").finish();
        let mut stream = stream(&dump);
        assert_eq!(stream.by_ref().count(), 1);
        assert_eq!(stream.summary().stored_checksum, None);
    }

    #[test]
    fn stop_ends_without_reading_further() {
        let dump = DumpBuilder::new(12)
            .string_object(b"a", b"1")
            .byte(200)
            .finish();

        let mut stream = stream(&dump);
        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.payload, ObjectPayload::String(b"1".to_vec()));
        stream.stop();
        assert!(stream.next().is_none());
        assert!(stream.summary().stopped_early);
    }
}
