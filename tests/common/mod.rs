// tests/common/mod.rs

//! Shared fixture builders for integration tests.

use sklfix::registry::path_hash;
use sklfix::wad::{WadBuilder, WadEntryBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A minimal legacy (`r3d2sklt`) skeleton with identity-transform joints.
pub fn legacy_skeleton(joint_names: &[&str]) -> Vec<u8> {
    const IDENTITY: [f32; 12] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ];

    let mut out = Vec::new();
    out.extend_from_slice(b"r3d2sklt");
    out.extend_from_slice(&1u32.to_le_bytes()); // revision
    out.extend_from_slice(&0u32.to_le_bytes()); // skeleton id
    out.extend_from_slice(&(joint_names.len() as u32).to_le_bytes());
    for (index, name) in joint_names.iter().enumerate() {
        let mut name_field = [0u8; 32];
        name_field[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&name_field);
        let parent: i32 = if index == 0 { -1 } else { index as i32 - 1 };
        out.extend_from_slice(&parent.to_le_bytes());
        out.extend_from_slice(&1.0f32.to_le_bytes()); // legacy scale
        for v in IDENTITY {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}

/// `info.json` bytes in the shape Fantome packages use.
pub fn info_json(name: &str, version: &str) -> Vec<u8> {
    format!("{{\"Name\": \"{name}\", \"Version\": \"{version}\"}}").into_bytes()
}

/// Write a package zip with the given (entry name, payload) pairs.
pub fn write_package(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, payload) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(payload).unwrap();
    }
    zip.finish().unwrap();
}

/// Build a container holding the given (asset path, payload) pairs as
/// uncompressed entries.
pub fn build_container(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = WadBuilder::new();
    for (path, payload) in entries {
        builder.push(WadEntryBuilder::uncompressed(path_hash(path), payload.to_vec()));
    }
    builder.build()
}
