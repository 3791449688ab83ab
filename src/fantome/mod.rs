// src/fantome/mod.rs

//! Fantome package inspection
//!
//! A Fantome package is a zip archive with a `META/` folder holding the
//! descriptor (`info.json`, optionally a thumbnail) and exactly one payload
//! root: `RAW/` for loose asset files addressed by relative path, or `WAD/`
//! for prebuilt binary containers. Packages are opened read-only; migration
//! output always goes to a brand-new archive.

pub mod info;

pub use info::ModInfo;

use crate::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Payload layout of a package, mutually exclusive per package.
///
/// Carries the zip entry names under the payload root. When both roots are
/// present the loose layout wins.
#[derive(Debug)]
pub enum Layout {
    /// `RAW/` subtree: assets stored as individual files
    Loose(Vec<String>),
    /// `WAD/` subtree: one or more binary containers
    Container(Vec<String>),
}

/// Read-only view over an opened package
pub struct ModPackage {
    archive: ZipArchive<File>,
    names: Vec<String>,
}

impl ModPackage {
    /// Open a package from disk
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        // Entry names in archive order; file_names() does not guarantee it
        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            names.push(archive.by_index_raw(index)?.name().to_string());
        }
        Ok(Self { archive, names })
    }

    /// Whether the package has a `META/` folder at all
    pub fn has_meta(&self) -> bool {
        self.names.iter().any(|n| in_folder(n, "META").is_some())
    }

    /// Parse the descriptor from `META/info.json`.
    ///
    /// Returns `Ok(None)` when no `info.json` entry exists; a malformed
    /// descriptor is an error.
    pub fn info(&mut self) -> Result<Option<ModInfo>> {
        let name = self.meta_entry("info.json");
        match name {
            Some(name) => {
                let data = self.read(&name)?;
                Ok(Some(ModInfo::parse(&data)?))
            }
            None => Ok(None),
        }
    }

    /// Classify the payload root
    pub fn layout(&self) -> Option<Layout> {
        let raw: Vec<String> = self
            .names
            .iter()
            .filter(|n| in_folder(n, "RAW").is_some_and(|rest| !rest.is_empty()))
            .cloned()
            .collect();
        if !raw.is_empty() {
            return Some(Layout::Loose(raw));
        }

        let wad: Vec<String> = self
            .names
            .iter()
            .filter(|n| in_folder(n, "WAD").is_some_and(|rest| !rest.is_empty()))
            .cloned()
            .collect();
        if !wad.is_empty() {
            return Some(Layout::Container(wad));
        }

        None
    }

    /// Thumbnail bytes (`META/image.png`), if the package carries one
    pub fn thumbnail(&mut self) -> Result<Option<Vec<u8>>> {
        match self.meta_entry("image.png") {
            Some(name) => Ok(Some(self.read(&name)?)),
            None => Ok(None),
        }
    }

    /// Read one entry fully into memory
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Full entry name of the `META/` file with the given (lowercased)
    /// file name
    fn meta_entry(&self, file_name: &str) -> Option<String> {
        self.names
            .iter()
            .find(|n| {
                in_folder(n, "META").is_some() && base_name(n).eq_ignore_ascii_case(file_name)
            })
            .cloned()
    }
}

/// Remainder of `name` below `folder`, if the entry lives there.
///
/// Packages built on Windows sometimes use backslash separators; both are
/// accepted.
pub fn in_folder<'a>(name: &'a str, folder: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(folder)?;
    rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\'))
}

/// Last path segment of a zip entry name
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Asset path of a loose entry: the `RAW/`-stripped name with forward
/// slashes, the shape the container's path hashing expects
pub fn asset_path(name: &str) -> String {
    in_folder(name, "RAW").unwrap_or(name).replace('\\', "/")
}

/// Extension of an entry's file name, lowercased, without the dot
pub fn extension(name: &str) -> Option<String> {
    let base = base_name(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_folder() {
        assert_eq!(in_folder("META/info.json", "META"), Some("info.json"));
        assert_eq!(in_folder("META\\info.json", "META"), Some("info.json"));
        assert_eq!(in_folder("RAW/a/b.skl", "RAW"), Some("a/b.skl"));
        assert_eq!(in_folder("METAx/info.json", "META"), None);
        assert_eq!(in_folder("other/META/info.json", "META"), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("META/info.json"), "info.json");
        assert_eq!(base_name("WAD\\Ahri.wad.client"), "Ahri.wad.client");
        assert_eq!(base_name("plain"), "plain");
    }

    #[test]
    fn test_asset_path_strips_raw_prefix() {
        assert_eq!(
            asset_path("RAW/ASSETS/Characters/Ahri/model.skl"),
            "ASSETS/Characters/Ahri/model.skl"
        );
        assert_eq!(asset_path("RAW\\ASSETS\\x.bin"), "ASSETS/x.bin");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("RAW/a/model.skl").as_deref(), Some("skl"));
        assert_eq!(extension("a/Model.SKL").as_deref(), Some("skl"));
        assert_eq!(extension("a/sound.bnk").as_deref(), Some("bnk"));
        assert_eq!(extension("RAW/a/noext"), None);
        assert_eq!(extension("RAW/a/.hidden"), None);
    }
}
