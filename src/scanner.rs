// src/scanner.rs

//! Package discovery
//!
//! Walks input locations (files or directories, recursively) and yields the
//! candidate package paths. A plain file qualifies only if its extension
//! marks it as a Fantome package. Unreadable subtrees are logged and
//! skipped; they never abort the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extensions that mark a file as a Fantome package
const PACKAGE_EXTENSIONS: [&str; 2] = ["zip", "fantome"];

/// Whether a path carries one of the package extensions
pub fn is_package(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PACKAGE_EXTENSIONS.iter().any(|p| e.eq_ignore_ascii_case(p)))
        .unwrap_or(false)
}

/// Discover package files under the given input locations.
///
/// Returns the paths in input order (walk order within a directory),
/// deduplicated.
pub fn discover(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();

    for input in inputs {
        for entry in WalkDir::new(input).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(input = %input.display(), "skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_package(entry.path()) {
                continue;
            }
            if seen.insert(entry.path().to_path_buf()) {
                packages.push(entry.path().to_path_buf());
            }
        }
    }

    packages
}
