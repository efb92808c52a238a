//! Entry framing for the product info caches (appinfo/packageinfo).
//!
//! The Steam client caches product metadata in length-framed binary files:
//! an 8-byte global header, then records of `id` + fixed metadata + nested
//! payload, terminated by a sentinel id of `0`. This module validates the
//! header, walks the records, and hands each nested payload out as opaque
//! bytes; decoding the nested key-value structure is an external concern.
//!
//! Framing either succeeds for the whole file or fails with a
//! [`FormatError`] — there is no partial result.

use indexmap::IndexMap;
use tracing::{debug, trace};

// ============================================================
// FORMAT CONSTANTS
// ============================================================
//
// Fixed by the cache producer (the Steam client); these are binary
// contract values, not configuration.

/// Expected value of the header version field
pub const CACHE_MAGIC: u32 = 0x0756_4427;

/// Expected universe id (the public Steam universe)
pub const CACHE_UNIVERSE: u32 = 1;

/// Global header size: version + universe, both little-endian u32
pub const HEADER_LEN: usize = 8;

/// Record id that terminates the stream; never a record itself
pub const SENTINEL_ID: u32 = 0;

/// Fixed metadata bytes per record, declared-size field included
pub const ENTRY_META_LEN: usize = 44;

// ============================================================
// ERRORS
// ============================================================

/// Error types for cache framing
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("cache shorter than the {HEADER_LEN}-byte header")]
    HeaderTooShort,
    #[error("bad cache magic {found:#010x} (expected {:#010x})", CACHE_MAGIC)]
    BadMagic { found: u32 },
    #[error("bad universe {found} (expected {})", CACHE_UNIVERSE)]
    BadUniverse { found: u32 },
    #[error("record truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("record {id} declares {declared} bytes, fewer than its own metadata")]
    NegativeLength { id: u32, declared: u32 },
    #[error("payload of record {id} runs past the end of the cache")]
    PayloadOutOfBounds { id: u32 },
    #[error("cache ended without the terminator record")]
    MissingTerminator,
}

// ============================================================
// HEADER
// ============================================================

/// Global cache header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheHeader {
    /// Format version; must match [`CACHE_MAGIC`]
    pub version: u32,
    /// Universe id; must be [`CACHE_UNIVERSE`]
    pub universe: u32,
}

impl CacheHeader {
    /// Parse and validate the 8-byte header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(data);
        let (Some(version), Some(universe)) = (reader.u32(), reader.u32()) else {
            return Err(FormatError::HeaderTooShort);
        };
        if version != CACHE_MAGIC {
            return Err(FormatError::BadMagic { found: version });
        }
        if universe != CACHE_UNIVERSE {
            return Err(FormatError::BadUniverse { found: universe });
        }
        Ok(Self { version, universe })
    }
}

// ============================================================
// RECORD METADATA
// ============================================================

/// Fixed-width metadata preceding each record's payload (44 bytes).
///
/// Only `declared_size` drives framing: it counts every byte of the record
/// after the size field itself, metadata remainder plus payload. The other
/// fields are carried through undecoded for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryMeta {
    /// Bytes in this record after the size field itself
    pub declared_size: u32,
    /// Opaque client state flags
    pub state: u32,
    /// Unix time of the last update to this product
    pub last_updated: u32,
    /// Access token the client used to request the product
    pub access_token: u64,
    /// SHA-1 of the payload; never verified here
    pub checksum: [u8; 20],
    /// Change number of the cached revision
    pub change_number: u32,
}

impl EntryMeta {
    /// Serialized size in bytes
    pub const SIZE: usize = ENTRY_META_LEN;

    fn read(reader: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            declared_size: reader.u32()?,
            state: reader.u32()?,
            last_updated: reader.u32()?,
            access_token: reader.u64()?,
            checksum: reader.array()?,
            change_number: reader.u32()?,
        })
    }

    /// Payload bytes following this metadata.
    ///
    /// `declared_size` already covers the 40 metadata bytes after the size
    /// field, so the payload is whatever remains. `None` if the record
    /// declares fewer bytes than its own metadata.
    fn payload_len(&self) -> Option<usize> {
        let declared = u64::from(self.declared_size) + 4;
        let len = declared.checked_sub(Self::SIZE as u64)?;
        usize::try_from(len).ok()
    }
}

// ============================================================
// OPAQUE PAYLOAD
// ============================================================

/// Undecoded binary key-value payload of one record.
///
/// The framer has no parsing authority over these bytes; they go to an
/// external recursive key-value decoder as-is. The newtype keeps raw and
/// decoded data apart at the type level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawVdf(Box<[u8]>);

impl RawVdf {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Box<[u8]> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for RawVdf {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

// ============================================================
// RECORD ITERATION
// ============================================================

/// Borrowed view of one framed record
#[derive(Clone, Copy, Debug)]
pub struct RecordView<'a> {
    /// Application or package id
    pub id: u32,
    /// Fixed metadata block
    pub meta: EntryMeta,
    /// Nested payload, opaque to the framer
    pub payload: &'a [u8],
}

/// Owned record from a fully parsed cache
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Application or package id
    pub id: u32,
    /// Fixed metadata block
    pub meta: EntryMeta,
    /// Nested payload, opaque to the framer
    pub payload: RawVdf,
}

/// Lazy iterator over the records of a product cache.
///
/// Construction validates the global header; iteration then yields one
/// record at a time until the sentinel id, which is consumed but not
/// yielded. Any framing error ends the iteration after being yielded
/// once.
pub struct Entries<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Entries<'a> {
    /// Validate the header and position the iterator on the first record.
    pub fn new(data: &'a [u8]) -> Result<Self, FormatError> {
        let header = CacheHeader::parse(data)?;
        trace!(version = header.version, universe = header.universe, "cache header accepted");
        let mut reader = Reader::new(data);
        reader.skip(HEADER_LEN);
        Ok(Self { reader, done: false })
    }

    fn read_record(&mut self) -> Result<Option<RecordView<'a>>, FormatError> {
        let start = self.reader.position();
        let Some(id) = self.reader.u32() else {
            // A well-formed stream always ends in the sentinel
            return Err(FormatError::MissingTerminator);
        };
        if id == SENTINEL_ID {
            return Ok(None);
        }

        let Some(meta) = EntryMeta::read(&mut self.reader) else {
            return Err(FormatError::Truncated { offset: start });
        };
        let payload_len = meta.payload_len().ok_or(FormatError::NegativeLength {
            id,
            declared: meta.declared_size,
        })?;
        let Some(payload) = self.reader.take(payload_len) else {
            return Err(FormatError::PayloadOutOfBounds { id });
        };

        trace!(id, payload_len, "framed cache record");
        Ok(Some(RecordView { id, meta, payload }))
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<RecordView<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Parse a full product cache into an ordered id → entry mapping.
///
/// Entries keep first-seen order; a repeated id overwrites the earlier
/// entry in place, so the last occurrence wins without reordering.
pub fn parse_entries(data: &[u8]) -> Result<IndexMap<u32, CacheEntry>, FormatError> {
    let mut entries = IndexMap::new();
    for record in Entries::new(data)? {
        let record = record?;
        entries.insert(
            record.id,
            CacheEntry {
                id: record.id,
                meta: record.meta,
                payload: RawVdf::from(record.payload),
            },
        );
    }
    debug!(count = entries.len(), "parsed product cache");
    Ok(entries)
}

// ============================================================
// BYTE READER
// ============================================================

/// Bounds-checked little-endian cursor over the cache bytes
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn skip(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len).min(self.data.len());
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N).and_then(|bytes| bytes.try_into().ok())
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.array().map(u64::from_le_bytes)
    }
}

// ============================================================
// TESTS
// ============================================================
