// src/registry.rs

//! Static hash registry for container entries
//!
//! Container entries are addressed by the xxh64 hash of their lowercased
//! asset path, not by a path string. The registry maps every known skeleton
//! asset hash back to its canonical path and is the only way to recognize a
//! skeleton entry inside a container. It is loaded once at startup and never
//! mutated; a missing or corrupt registry file aborts the whole run before
//! any package is touched.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// Default registry file name, expected next to the executable
pub const REGISTRY_FILE: &str = "hashes_game.json";

/// Immutable mapping from 64-bit path hash to canonical asset path
#[derive(Debug)]
pub struct HashRegistry {
    entries: HashMap<u64, String>,
}

impl HashRegistry {
    /// Load the registry from a JSON object file.
    ///
    /// Keys must be exactly 16 lowercase hex digits; values are the
    /// canonical asset paths. Any malformed key fails the load.
    pub fn load(path: &Path) -> Result<Self> {
        let registry_error = |reason: String| Error::Registry {
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(path)
            .map_err(|e| registry_error(format!("cannot read: {e}")))?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| registry_error(format!("not a JSON object of strings: {e}")))?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            if key.len() != 16 || key.bytes().any(|b| !b.is_ascii_hexdigit() || b.is_ascii_uppercase()) {
                return Err(registry_error(format!(
                    "key {key:?} is not a 16-digit lowercase hex hash"
                )));
            }
            let hash = u64::from_str_radix(&key, 16)
                .map_err(|e| registry_error(format!("key {key:?}: {e}")))?;
            entries.insert(hash, value);
        }

        debug!(count = entries.len(), "hash registry loaded");
        Ok(Self { entries })
    }

    /// Build a registry from known paths (hashing each one). Test seam.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = paths
            .into_iter()
            .map(|p| {
                let p = p.into();
                (path_hash(&p), p)
            })
            .collect();
        Self { entries }
    }

    /// Whether the hash belongs to a tracked skeleton asset
    pub fn contains(&self, hash: u64) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Canonical path for a tracked hash, if known
    pub fn get(&self, hash: u64) -> Option<&str> {
        self.entries.get(&hash).map(String::as_str)
    }

    /// Number of tracked assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hash an asset path the way the container format addresses entries:
/// xxh64 (seed 0) over the lowercased path.
pub fn path_hash(path: &str) -> u64 {
    xxh64(path.to_lowercase().as_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_registry(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_registry() {
        let path = "assets/characters/ahri/skins/base/ahri.skl";
        let json = format!("{{\"{:016x}\": \"{path}\"}}", path_hash(path));
        let file = write_registry(&json);

        let registry = HashRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(path_hash(path)));
        assert_eq!(registry.get(path_hash(path)), Some(path));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = HashRegistry::load(Path::new("/nonexistent/hashes_game.json"));
        assert!(matches!(result, Err(Error::Registry { .. })));
    }

    #[test]
    fn test_rejects_non_object_json() {
        let file = write_registry("[1, 2, 3]");
        assert!(HashRegistry::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_short_key() {
        let file = write_registry("{\"abc\": \"assets/x.skl\"}");
        assert!(HashRegistry::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_uppercase_key() {
        let file = write_registry("{\"00000000DEADBEEF\": \"assets/x.skl\"}");
        assert!(HashRegistry::load(file.path()).is_err());
    }

    #[test]
    fn test_path_hash_is_case_insensitive() {
        assert_eq!(
            path_hash("ASSETS/Characters/Ahri/ahri.skl"),
            path_hash("assets/characters/ahri/ahri.skl")
        );
    }

    #[test]
    fn test_absent_hash_means_untracked() {
        let registry = HashRegistry::from_paths(["assets/a.skl"]);
        assert!(!registry.contains(0));
    }
}
