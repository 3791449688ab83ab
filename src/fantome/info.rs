// src/fantome/info.rs

//! Mod descriptor (`META/info.json`)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Description written into every migrated package
pub const UPDATED_DESCRIPTION: &str = "Updated the model to the latest version";

/// The package descriptor stored at `META/info.json`.
///
/// `version` is a fixed-point string with exactly one decimal digit; it is
/// bumped by 0.1 on every successful migration and re-serialized in the
/// same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModInfo {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "version")]
    pub version: String,
    #[serde(alias = "author", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(alias = "description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModInfo {
    /// Parse a descriptor from `info.json` bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Serialize back to `info.json` bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Bump the version by 0.1 and replace the description with the fixed
    /// update message.
    ///
    /// The version must already be a one-decimal fixed-point string; inputs
    /// like `"2"` or `"1.23"` are rejected rather than coerced.
    pub fn bump(&mut self) -> Result<()> {
        self.version = bump_version(&self.version)?;
        self.description = Some(UPDATED_DESCRIPTION.to_string());
        Ok(())
    }

    /// File name of the migrated package:
    /// `"<name> - <version> (By <author-or-'Unknown'>).zip"`.
    pub fn output_file_name(&self) -> String {
        let author = self
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown");
        format!("{} - {} (By {}).zip", self.name.trim(), self.version, author)
    }
}

/// Add 0.1 to a one-decimal fixed-point version string.
///
/// `"1.3"` becomes `"1.4"`, `"0.9"` becomes `"1.0"`. Anything that is not
/// `<integer>.<digit>` is an error.
fn bump_version(version: &str) -> Result<String> {
    let invalid = || Error::Version(version.to_string());

    let (major, minor) = version.split_once('.').ok_or_else(invalid)?;
    if major.is_empty() || minor.len() != 1 || !major.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let major: u64 = major.parse().map_err(|_| invalid())?;
    let minor: u64 = minor.parse().map_err(|_| invalid())?;

    let tenths = major
        .checked_mul(10)
        .and_then(|t| t.checked_add(minor + 1))
        .ok_or_else(invalid)?;
    Ok(format!("{}.{}", tenths / 10, tenths % 10))
}
