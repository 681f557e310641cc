/// Errors raised while unpacking an in-memory compact container blob.
///
/// These are higher-level than the wire errors: the blob has
/// already been read off the wire in full, so truncation shows up here as
/// an inconsistency between the container's own size fields and the blob,
/// not as an end-of-input condition.
///
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │ TypeError (this crate)                               │
/// │   ├── CorruptContainer  ziplist/listpack/intset/...  │
/// │   └── InvalidScore      score text is not a number   │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// `offset` is relative to the start of the blob; the decoder adds the
/// blob's absolute position when it surfaces the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A compact container's bytes are internally inconsistent.
    #[error("corrupt {container} at blob offset {offset}: {reason}")]
    CorruptContainer {
        container: &'static str,
        offset: usize,
        reason: String,
    },

    /// A sorted-set score could not be parsed as a number.
    #[error("invalid sorted set score {text:?}")]
    InvalidScore { text: String },
}

impl TypeError {
    pub(crate) fn corrupt(container: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptContainer {
            container,
            offset,
            reason: reason.into(),
        }
    }
}
