// src/wad/mod.rs

//! The binary asset container format
//!
//! A container is a little-endian file holding identifier-addressed entries:
//! a fixed header, one 32-byte descriptor per entry, then the concatenated
//! payload region. Entries carry no path strings — only the xxh64 hash of
//! their lowercased asset path.
//!
//! Layout:
//!
//! ```text
//! header      "RW" magic, major/minor version, 256-byte signature block
//!             (zeroed on output), u64 checksum, u32 entry count
//! descriptor  u64 path hash, u32 data offset, u32 compressed size,
//!             u32 uncompressed size, u8 kind, u8 duplicate flag, u16 pad,
//!             u64 payload checksum (xxh3 of the stored bytes)
//! payloads    entry payloads, in descriptor order, gap-free
//! ```

mod builder;
mod reader;

pub use builder::{WadBuilder, WadEntryBuilder};
pub use reader::Wad;

/// Container magic bytes
pub const MAGIC: [u8; 2] = *b"RW";

/// Container version written on output
pub const VERSION_MAJOR: u8 = 3;
pub const VERSION_MINOR: u8 = 3;

/// Size of the header's signature block
pub const SIGNATURE_SIZE: usize = 256;

/// Total header size
pub const HEADER_SIZE: usize = 2 + 1 + 1 + SIGNATURE_SIZE + 8 + 4;

/// Size of one entry descriptor
pub const ENTRY_SIZE: usize = 32;

/// File name suffix that marks a zip entry as a runtime container
pub const CONTAINER_SUFFIX: &str = ".wad.client";

/// How an entry's payload is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Raw bytes; compressed size equals uncompressed size
    Uncompressed,
    /// Gzip stream, found in legacy containers; read-only here
    Gzip,
    /// Zstandard stream, the only compressed kind produced on output
    Zstd,
}

impl EntryKind {
    /// Decode a descriptor kind byte. Unknown kinds are a parse error for
    /// the caller to surface, never silently mapped.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Uncompressed),
            1 => Some(Self::Gzip),
            3 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Descriptor kind byte
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Uncompressed => 0,
            Self::Gzip => 1,
            Self::Zstd => 3,
        }
    }

    /// Human-readable name for reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uncompressed => "uncompressed",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Storage kind for a loose asset, decided by extension: audio banks
    /// stay raw, everything else is zstd-compressed.
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "bnk" | "wpk" => Self::Uncompressed,
            _ => Self::Zstd,
        }
    }
}

/// One parsed entry descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WadEntry {
    pub path_hash: u64,
    pub offset: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub kind: EntryKind,
    pub duplicate: bool,
    pub checksum: u64,
}

impl WadEntry {
    /// Number of bytes this entry occupies in the payload region
    pub fn stored_size(&self) -> u32 {
        match self.kind {
            EntryKind::Uncompressed => self.uncompressed_size,
            _ => self.compressed_size,
        }
    }
}
