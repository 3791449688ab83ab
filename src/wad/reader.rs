// src/wad/reader.rs

//! Container parsing

use super::{EntryKind, WadEntry, ENTRY_SIZE, HEADER_SIZE, MAGIC, SIGNATURE_SIZE, VERSION_MAJOR};
use crate::compression;
use crate::{Error, Result};
use tracing::debug;

/// A fully buffered, parsed container.
///
/// The payload region is kept as-is; per-entry access hands out either the
/// stored bytes or a decompressed copy. Nothing here mutates the container.
pub struct Wad {
    name: String,
    data: Vec<u8>,
    entries: Vec<WadEntry>,
}

impl Wad {
    /// Parse a container from its full byte buffer.
    ///
    /// `name` is only used in error messages and reports. Descriptors are
    /// bounds-checked against the buffer; an unknown compression kind byte
    /// fails the parse.
    pub fn read(name: &str, data: Vec<u8>) -> Result<Self> {
        let malformed = |reason: String| Error::Container {
            name: name.to_string(),
            reason,
        };

        if data.len() < HEADER_SIZE {
            return Err(malformed(format!("truncated header ({} bytes)", data.len())));
        }
        if data[0..2] != MAGIC {
            return Err(malformed(format!("bad magic {:02x}{:02x}", data[0], data[1])));
        }
        let major = data[2];
        if major != VERSION_MAJOR {
            return Err(malformed(format!("unsupported container version {major}")));
        }

        let count_at = 4 + SIGNATURE_SIZE + 8;
        let entry_count = read_u32(&data, count_at) as usize;
        let payload_start = HEADER_SIZE + entry_count * ENTRY_SIZE;
        if payload_start > data.len() {
            return Err(malformed(format!(
                "descriptor table for {entry_count} entries exceeds file size"
            )));
        }

        let mut entries = Vec::with_capacity(entry_count);
        for index in 0..entry_count {
            let at = HEADER_SIZE + index * ENTRY_SIZE;
            let kind_byte = data[at + 20];
            let kind = EntryKind::from_byte(kind_byte)
                .ok_or_else(|| malformed(format!("entry {index}: unknown compression kind {kind_byte}")))?;
            let entry = WadEntry {
                path_hash: read_u64(&data, at),
                offset: read_u32(&data, at + 8),
                compressed_size: read_u32(&data, at + 12),
                uncompressed_size: read_u32(&data, at + 16),
                kind,
                duplicate: data[at + 21] != 0,
                checksum: read_u64(&data, at + 24),
            };

            let end = entry.offset as usize + entry.stored_size() as usize;
            if (entry.offset as usize) < payload_start || end > data.len() {
                return Err(malformed(format!(
                    "entry {index}: payload [{}, {end}) outside file",
                    entry.offset
                )));
            }
            entries.push(entry);
        }

        debug!(container = name, entries = entries.len(), "container parsed");
        Ok(Self {
            name: name.to_string(),
            data,
            entries,
        })
    }

    /// Container file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed entry descriptors, in file order
    pub fn entries(&self) -> &[WadEntry] {
        &self.entries
    }

    /// The bytes exactly as stored in the payload region
    pub fn stored(&self, entry: &WadEntry) -> &[u8] {
        let start = entry.offset as usize;
        &self.data[start..start + entry.stored_size() as usize]
    }

    /// The entry's payload, decompressed into a fresh buffer
    pub fn decompressed(&self, entry: &WadEntry) -> Result<Vec<u8>> {
        let stored = self.stored(entry);
        let data = match entry.kind {
            EntryKind::Uncompressed => stored.to_vec(),
            EntryKind::Gzip => compression::gzip_decompress(stored)?,
            EntryKind::Zstd => compression::zstd_decompress(stored)?,
        };
        Ok(data)
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
}

fn read_u64(data: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(data[at..at + 8].try_into().unwrap())
}
