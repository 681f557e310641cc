use crate::object::ObjectKind;

/// Value-type tag that precedes every key.
///
/// The tag names both the logical kind and the on-disk encoding. Several
/// encodings decode to the same kind; a list may be stored plainly, as a
/// ziplist, or as a quicklist of ziplists or listpacks.
///
/// ```text
/// ┌──────┬───────────────────┬───────────┬─────────────────────────────┐
/// │ Wire │ Variant           │ Kind      │ Body                        │
/// ├──────┼───────────────────┼───────────┼─────────────────────────────┤
/// │ 0    │ String            │ string    │ one string                  │
/// │ 1    │ List              │ list      │ len + strings               │
/// │ 2    │ Set               │ set       │ len + strings               │
/// │ 3    │ SortedSet         │ zset      │ len + (member, text score)  │
/// │ 4    │ Hash              │ hash      │ len + (field, value)        │
/// │ 5    │ SortedSet2        │ zset      │ len + (member, f64 score)   │
/// │ 6, 7 │ Module / Module2  │ -         │ not supported               │
/// │ 9    │ HashZipmap        │ hash      │ zipmap blob                 │
/// │ 10   │ ListZiplist       │ list      │ ziplist blob                │
/// │ 11   │ SetIntset         │ set       │ intset blob                 │
/// │ 12   │ SortedSetZiplist  │ zset      │ ziplist blob                │
/// │ 13   │ HashZiplist       │ hash      │ ziplist blob                │
/// │ 14   │ ListQuicklist     │ list      │ len + ziplist blobs         │
/// │ 15   │ StreamListpacks   │ stream    │ listpack nodes + groups     │
/// │ 16   │ HashListpack      │ hash      │ listpack blob               │
/// │ 17   │ SortedSetListpack │ zset      │ listpack blob               │
/// │ 18   │ ListQuicklist2    │ list      │ len + (container, blob)     │
/// │ 19   │ StreamListpacks2  │ stream    │ + v2 metadata               │
/// │ 20   │ SetListpack       │ set       │ listpack blob               │
/// │ 21   │ StreamListpacks3  │ stream    │ + v3 metadata               │
/// │ 22   │ HashMetadataPreGa │ -         │ not supported               │
/// │ 23   │ HashListpackExPreGa │ -       │ not supported               │
/// │ 24   │ HashMetadata      │ hash      │ per-field TTL, plain        │
/// │ 25   │ HashListpackEx    │ hash      │ per-field TTL, listpack     │
/// └──────┴───────────────────┴───────────┴─────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    List,
    Set,
    SortedSet,
    Hash,
    SortedSet2,
    Module,
    Module2,
    HashZipmap,
    ListZiplist,
    SetIntset,
    SortedSetZiplist,
    HashZiplist,
    ListQuicklist,
    StreamListpacks,
    HashListpack,
    SortedSetListpack,
    ListQuicklist2,
    StreamListpacks2,
    SetListpack,
    StreamListpacks3,
    HashMetadataPreGa,
    HashListpackExPreGa,
    HashMetadata,
    HashListpackEx,
    /// A tag no known writer assigns. The raw byte is kept for error
    /// reporting.
    Unknown(u8),
}

impl ValueType {
    pub fn wire_id(self) -> u8 {
        match self {
            Self::String => 0,
            Self::List => 1,
            Self::Set => 2,
            Self::SortedSet => 3,
            Self::Hash => 4,
            Self::SortedSet2 => 5,
            Self::Module => 6,
            Self::Module2 => 7,
            Self::HashZipmap => 9,
            Self::ListZiplist => 10,
            Self::SetIntset => 11,
            Self::SortedSetZiplist => 12,
            Self::HashZiplist => 13,
            Self::ListQuicklist => 14,
            Self::StreamListpacks => 15,
            Self::HashListpack => 16,
            Self::SortedSetListpack => 17,
            Self::ListQuicklist2 => 18,
            Self::StreamListpacks2 => 19,
            Self::SetListpack => 20,
            Self::StreamListpacks3 => 21,
            Self::HashMetadataPreGa => 22,
            Self::HashListpackExPreGa => 23,
            Self::HashMetadata => 24,
            Self::HashListpackEx => 25,
            Self::Unknown(id) => id,
        }
    }

    pub fn from_wire_id(id: u8) -> Self {
        match id {
            0 => Self::String,
            1 => Self::List,
            2 => Self::Set,
            3 => Self::SortedSet,
            4 => Self::Hash,
            5 => Self::SortedSet2,
            6 => Self::Module,
            7 => Self::Module2,
            9 => Self::HashZipmap,
            10 => Self::ListZiplist,
            11 => Self::SetIntset,
            12 => Self::SortedSetZiplist,
            13 => Self::HashZiplist,
            14 => Self::ListQuicklist,
            15 => Self::StreamListpacks,
            16 => Self::HashListpack,
            17 => Self::SortedSetListpack,
            18 => Self::ListQuicklist2,
            19 => Self::StreamListpacks2,
            20 => Self::SetListpack,
            21 => Self::StreamListpacks3,
            22 => Self::HashMetadataPreGa,
            23 => Self::HashListpackExPreGa,
            24 => Self::HashMetadata,
            25 => Self::HashListpackEx,
            other => Self::Unknown(other),
        }
    }

    /// Logical kind this encoding decodes to, or `None` for tags the
    /// decoder cannot materialize.
    pub fn kind(self) -> Option<ObjectKind> {
        match self {
            Self::String => Some(ObjectKind::String),
            Self::List | Self::ListZiplist | Self::ListQuicklist | Self::ListQuicklist2 => {
                Some(ObjectKind::List)
            }
            Self::Set | Self::SetIntset | Self::SetListpack => Some(ObjectKind::Set),
            Self::SortedSet
            | Self::SortedSet2
            | Self::SortedSetZiplist
            | Self::SortedSetListpack => Some(ObjectKind::SortedSet),
            Self::Hash
            | Self::HashZipmap
            | Self::HashZiplist
            | Self::HashListpack
            | Self::HashMetadata
            | Self::HashListpackEx => Some(ObjectKind::Hash),
            Self::StreamListpacks | Self::StreamListpacks2 | Self::StreamListpacks3 => {
                Some(ObjectKind::Stream)
            }
            Self::Module
            | Self::Module2
            | Self::HashMetadataPreGa
            | Self::HashListpackExPreGa
            | Self::Unknown(_) => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self.kind().is_some()
    }

    /// Encoding name as printed by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "zset",
            Self::Hash => "hash",
            Self::SortedSet2 => "zset2",
            Self::Module => "module",
            Self::Module2 => "module2",
            Self::HashZipmap => "hash-zipmap",
            Self::ListZiplist => "list-ziplist",
            Self::SetIntset => "set-intset",
            Self::SortedSetZiplist => "zset-ziplist",
            Self::HashZiplist => "hash-ziplist",
            Self::ListQuicklist => "list-quicklist",
            Self::StreamListpacks => "stream-listpacks",
            Self::HashListpack => "hash-listpack",
            Self::SortedSetListpack => "zset-listpack",
            Self::ListQuicklist2 => "list-quicklist2",
            Self::StreamListpacks2 => "stream-listpacks2",
            Self::SetListpack => "set-listpack",
            Self::StreamListpacks3 => "stream-listpacks3",
            Self::HashMetadataPreGa => "hash-metadata-pre-ga",
            Self::HashListpackExPreGa => "hash-listpack-ex-pre-ga",
            Self::HashMetadata => "hash-metadata",
            Self::HashListpackEx => "hash-listpack-ex",
            Self::Unknown(_) => "unknown",
        }
    }
}
