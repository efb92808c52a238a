//! Steam Cache - byte-exact decoders for Steam client local cache files
//!
//! This crate provides the decoding core of a cover-art repair utility for
//! Steam libraries. It owns the byte-level algorithms:
//! - License cache decryption (account-seeded keystream, XOR obfuscation)
//! - Product cache framing (appinfo/packageinfo record streams)
//! - Cover image dimension probing (PNG/JPEG header sniffing)
//!
//! ## Architecture
//!
//! ```text
//! licensecache bytes
//!     ↓ license::decrypt_license_cache
//! serialized license message → external protobuf decoder
//!     └── rng::RandomStream (Park–Miller LCG + Bays–Durham shuffle)
//!
//! appinfo.vdf / packageinfo.vdf bytes
//!     ↓ appinfo::parse_entries
//! id → (metadata, RawVdf) → external key-value decoder
//!
//! downloaded cover bytes
//!     ↓ image::probe_dimensions
//! 600×900 gate before writing to the grid directory
//! ```
//!
//! Steam login, the cover service REST client, file path discovery, and
//! the nested payload decoders are external collaborators; nothing in this
//! crate performs I/O.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod appinfo;
pub mod image;
pub mod license;
pub mod rng;

pub use appinfo::{
    parse_entries, CacheEntry, CacheHeader, Entries, EntryMeta, FormatError, RawVdf, RecordView,
    CACHE_MAGIC, CACHE_UNIVERSE, ENTRY_META_LEN, SENTINEL_ID,
};
pub use image::{is_cover_sized, probe_dimensions, ProbeError, COVER_HEIGHT, COVER_WIDTH};
pub use license::{decrypt, decrypt_license_cache, LICENSE_TRAILER_LEN};
pub use rng::{RandomStream, MAX_RANDOM_RANGE, NTAB};
