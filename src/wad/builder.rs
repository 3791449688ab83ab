// src/wad/builder.rs

//! Container serialization

use super::{EntryKind, ENTRY_SIZE, HEADER_SIZE, MAGIC, SIGNATURE_SIZE, VERSION_MAJOR, VERSION_MINOR};
use crate::registry::path_hash;
use xxhash_rust::xxh3::xxh3_64;

/// One entry queued for serialization.
///
/// The payload is owned and final at construction time, so the descriptor
/// sizes always match the bytes that end up in the payload region.
pub struct WadEntryBuilder {
    hash: u64,
    kind: EntryKind,
    stored: Vec<u8>,
    uncompressed_size: u32,
}

impl WadEntryBuilder {
    /// An entry stored raw
    pub fn uncompressed(hash: u64, data: Vec<u8>) -> Self {
        let len = data.len() as u32;
        Self {
            hash,
            kind: EntryKind::Uncompressed,
            stored: data,
            uncompressed_size: len,
        }
    }

    /// An entry stored as an already-compressed zstd stream
    pub fn zstd(hash: u64, compressed: Vec<u8>, uncompressed_size: u32) -> Self {
        Self {
            hash,
            kind: EntryKind::Zstd,
            stored: compressed,
            uncompressed_size,
        }
    }

    /// Identifier hash for a known asset path
    pub fn hash_for_path(path: &str) -> u64 {
        path_hash(path)
    }

    /// Identifier of this entry
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Size the entry occupies in the payload region
    pub fn stored_size(&self) -> u32 {
        self.stored.len() as u32
    }
}

/// Accumulates entries and serializes one container.
///
/// Entries are kept in submission order, never deduplicated or reordered;
/// descriptor offsets come out monotonically increasing and gap-free.
#[derive(Default)]
pub struct WadBuilder {
    entries: Vec<WadEntryBuilder>,
}

impl WadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry
    pub fn push(&mut self, entry: WadEntryBuilder) {
        self.entries.push(entry);
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are queued
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the container: header, descriptor table, payload region
    pub fn build(&self) -> Vec<u8> {
        let payload_size: usize = self.entries.iter().map(|e| e.stored.len()).sum();
        let mut out =
            Vec::with_capacity(HEADER_SIZE + self.entries.len() * ENTRY_SIZE + payload_size);

        out.extend_from_slice(&MAGIC);
        out.push(VERSION_MAJOR);
        out.push(VERSION_MINOR);
        out.extend_from_slice(&[0u8; SIGNATURE_SIZE]);
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut offset = (HEADER_SIZE + self.entries.len() * ENTRY_SIZE) as u32;
        for entry in &self.entries {
            let compressed_size = match entry.kind {
                EntryKind::Uncompressed => entry.uncompressed_size,
                _ => entry.stored.len() as u32,
            };
            out.extend_from_slice(&entry.hash.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&compressed_size.to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.push(entry.kind.as_byte());
            out.push(0); // duplicate flag
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&xxh3_64(&entry.stored).to_le_bytes());
            offset += entry.stored.len() as u32;
        }

        for entry in &self.entries {
            out.extend_from_slice(&entry.stored);
        }

        out
    }
}
