// src/migrate.rs

//! Per-package migration pipeline
//!
//! One package at a time: inspect, classify, transcode, rebuild the
//! container, assemble the output zip. A package either yields one complete
//! new archive in the output directory or nothing at all — any failure on a
//! selected entry aborts the whole package.

use crate::codec::SkeletonCodec;
use crate::compression;
use crate::fantome::{self, Layout, ModInfo, ModPackage};
use crate::registry::{path_hash, HashRegistry};
use crate::wad::{EntryKind, Wad, WadBuilder, WadEntryBuilder, CONTAINER_SUFFIX};
use crate::{Error, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Extension that always selects a loose entry for transcoding
const SKELETON_EXTENSION: &str = "skl";

/// Character asset paths carry the container name as the segment after
/// `characters/`
static CHARACTER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^assets/characters/([a-z]+)/").unwrap());

/// Result of migrating one package
#[derive(Debug)]
pub enum Outcome {
    /// A new package was written
    Updated { path: PathBuf },
    /// Nothing was produced, for a reportable reason
    Skipped(SkipReason),
}

/// Recoverable per-package skip conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `META/` folder at all
    NoMeta,
    /// `info.json` missing or malformed
    BadInfo,
    /// Neither `RAW/` nor `WAD/` payload present
    NoPayload,
    /// Loose layout without a single `.skl` entry
    NoSkeletonFile,
    /// No container entry matched the registry, or the container name could
    /// not be derived
    NotUpdated,
}

impl SkipReason {
    /// Operator-facing reason text
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoMeta => "does not have META folder",
            Self::BadInfo => "has a missing or malformed info.json",
            Self::NoPayload => "has neither wad folder nor raw folder",
            Self::NoSkeletonFile => "has no skl file",
            Self::NotUpdated => "could not be updated",
        }
    }
}

/// Classification result of a package's payload
enum Classified {
    Build {
        container_name: String,
        builder: WadBuilder,
    },
    Skip(SkipReason),
}

/// Migrate a single package.
///
/// Recoverable skip conditions come back as [`Outcome::Skipped`]; real
/// failures (zip/container/codec/io) come back as `Err` and likewise leave
/// no output behind. The registry is shared, read-only state; everything
/// else lives and dies within this call.
pub fn migrate_package<C: SkeletonCodec>(
    path: &Path,
    registry: &HashRegistry,
    codec: &C,
    out_dir: &Path,
) -> Result<Outcome> {
    let mut package = ModPackage::open(path)?;

    if !package.has_meta() {
        return Ok(Outcome::Skipped(SkipReason::NoMeta));
    }
    let mut info = match package.info() {
        Ok(Some(info)) => info,
        Ok(None) | Err(Error::Json(_)) => return Ok(Outcome::Skipped(SkipReason::BadInfo)),
        Err(e) => return Err(e),
    };
    let Some(layout) = package.layout() else {
        return Ok(Outcome::Skipped(SkipReason::NoPayload));
    };

    let classified = match layout {
        Layout::Loose(entries) => collect_loose(&mut package, &entries, codec)?,
        Layout::Container(entries) => collect_container(&mut package, &entries, registry, codec)?,
    };
    let (container_name, builder) = match classified {
        Classified::Build {
            container_name,
            builder,
        } => (container_name, builder),
        Classified::Skip(reason) => return Ok(Outcome::Skipped(reason)),
    };

    info.bump()?;
    let thumbnail = package.thumbnail()?;
    let output = assemble(out_dir, &info, &container_name, &builder, thumbnail)?;
    info!(package = %path.display(), output = %output.display(), "package migrated");
    Ok(Outcome::Updated { path: output })
}

/// Loose mode: pass one classifies entry names (skeleton presence, output
/// container name), pass two reads payloads and collects entries.
fn collect_loose<C: SkeletonCodec>(
    package: &mut ModPackage,
    entries: &[String],
    codec: &C,
) -> Result<Classified> {
    let mut has_skeleton = false;
    let mut container_name = None;
    for name in entries {
        if fantome::extension(name).as_deref() == Some(SKELETON_EXTENSION) {
            has_skeleton = true;
        }
        if container_name.is_none() {
            container_name = character_name(&fantome::asset_path(name));
        }
    }
    if !has_skeleton {
        return Ok(Classified::Skip(SkipReason::NoSkeletonFile));
    }
    let Some(container_name) = container_name else {
        return Ok(Classified::Skip(SkipReason::NotUpdated));
    };

    let mut builder = WadBuilder::new();
    for name in entries {
        if fantome::base_name(name).is_empty() {
            continue; // directory entry
        }
        let asset = fantome::asset_path(name);
        let hash = path_hash(&asset);
        let data = package.read(name)?;

        if fantome::extension(name).as_deref() == Some(SKELETON_EXTENSION) {
            builder.push(transcode_entry(codec, hash, &data)?);
        } else {
            let extension = fantome::extension(name).unwrap_or_default();
            // Loose files arrive decompressed; anything mapped to zstd is
            // compressed fresh here
            if EntryKind::for_extension(&extension) == EntryKind::Uncompressed {
                builder.push(WadEntryBuilder::uncompressed(hash, data));
            } else {
                let uncompressed_size = data.len() as u32;
                let compressed = compression::zstd_compress(&data)?;
                builder.push(WadEntryBuilder::zstd(hash, compressed, uncompressed_size));
            }
        }
    }

    debug!(container = container_name, entries = builder.len(), "loose layout collected");
    Ok(Classified::Build {
        container_name,
        builder,
    })
}

/// Container mode: the first `.wad.client` container with a registry hit is
/// rebuilt; the hit check happens on the parsed descriptor table before any
/// entry is collected.
fn collect_container<C: SkeletonCodec>(
    package: &mut ModPackage,
    entries: &[String],
    registry: &HashRegistry,
    codec: &C,
) -> Result<Classified> {
    for name in entries {
        let file_name = fantome::base_name(name).to_string();
        if !file_name.contains(CONTAINER_SUFFIX) {
            continue;
        }
        let data = package.read(name)?;
        let wad = Wad::read(&file_name, data)?;
        if !wad.entries().iter().any(|e| registry.contains(e.path_hash)) {
            debug!(container = file_name, "no registry hit, container left alone");
            continue;
        }

        let mut builder = WadBuilder::new();
        for entry in wad.entries() {
            if registry.contains(entry.path_hash) {
                let decoded = wad.decompressed(entry)?;
                builder.push(transcode_entry(codec, entry.path_hash, &decoded)?);
            } else {
                // Passthrough preserves the stored stream byte-identically
                match entry.kind {
                    EntryKind::Uncompressed => builder.push(WadEntryBuilder::uncompressed(
                        entry.path_hash,
                        wad.stored(entry).to_vec(),
                    )),
                    EntryKind::Zstd => builder.push(WadEntryBuilder::zstd(
                        entry.path_hash,
                        wad.stored(entry).to_vec(),
                        entry.uncompressed_size,
                    )),
                    EntryKind::Gzip => {
                        return Err(Error::UnsupportedKind {
                            hash: entry.path_hash,
                            kind: entry.kind.name(),
                        })
                    }
                }
            }
        }

        debug!(container = file_name, entries = builder.len(), "container collected");
        return Ok(Classified::Build {
            container_name: file_name,
            builder,
        });
    }

    Ok(Classified::Skip(SkipReason::NotUpdated))
}

/// Decode, re-encode through the codec, recompress. The pre-compression
/// length becomes the entry's uncompressed size.
fn transcode_entry<C: SkeletonCodec>(
    codec: &C,
    hash: u64,
    data: &[u8],
) -> Result<WadEntryBuilder> {
    let encoded = codec.transcode(data)?;
    let uncompressed_size = encoded.len() as u32;
    let compressed = compression::zstd_compress(&encoded)?;
    Ok(WadEntryBuilder::zstd(hash, compressed, uncompressed_size))
}

/// Output container name for a character asset path, if the path matches
fn character_name(asset_path: &str) -> Option<String> {
    CHARACTER_PATH
        .captures(asset_path)
        .map(|captures| captures[1].to_string())
}

/// Write the output package: descriptor, rebuilt container, thumbnail.
///
/// The zip is written to a temp file in the destination directory and
/// renamed into place once finalized, so no partial package is ever visible
/// under the final name.
fn assemble(
    out_dir: &Path,
    info: &ModInfo,
    container_name: &str,
    builder: &WadBuilder,
    thumbnail: Option<Vec<u8>>,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let output = out_dir.join(info.output_file_name());

    let temp = tempfile::NamedTempFile::new_in(out_dir)?;
    let mut zip = ZipWriter::new(temp);
    let options = SimpleFileOptions::default();

    zip.start_file("META/info.json", options)?;
    zip.write_all(&info.to_json()?)?;

    zip.start_file(format!("WAD/{}", container_file_name(container_name)), options)?;
    zip.write_all(&builder.build())?;

    if let Some(thumbnail) = thumbnail {
        zip.start_file("META/image.png", options)?;
        zip.write_all(&thumbnail)?;
    }

    let temp = zip.finish()?;
    temp.persist(&output).map_err(|e| Error::Io(e.error))?;
    Ok(output)
}

/// Append the container suffix when the derived name lacks it
fn container_file_name(name: &str) -> String {
    if name.contains(CONTAINER_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{CONTAINER_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_name_from_asset_path() {
        assert_eq!(
            character_name("ASSETS/Characters/Ahri/Skins/Base/model.skl").as_deref(),
            Some("Ahri")
        );
        assert_eq!(
            character_name("assets/characters/zed/zed.skl").as_deref(),
            Some("zed")
        );
        assert_eq!(character_name("ASSETS/Shared/particles.bin"), None);
        assert_eq!(character_name("DATA/Characters/Ahri/x.bin"), None);
    }

    #[test]
    fn test_container_file_name_suffix() {
        assert_eq!(container_file_name("Ahri"), "Ahri.wad.client");
        assert_eq!(container_file_name("Ahri.wad.client"), "Ahri.wad.client");
    }

    #[test]
    fn test_skip_reason_messages_name_the_condition() {
        assert_eq!(SkipReason::NoMeta.message(), "does not have META folder");
        assert_eq!(SkipReason::NoSkeletonFile.message(), "has no skl file");
        assert_eq!(SkipReason::NotUpdated.message(), "could not be updated");
    }
}
