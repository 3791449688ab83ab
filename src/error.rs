// src/error.rs

//! Crate-wide error type

use thiserror::Error;

/// Result type for sklfix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while migrating a package
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip wrapper could not be read or written
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compression or decompression failed
    #[error(transparent)]
    Compression(#[from] crate::compression::CompressionError),

    /// Skeleton codec failure on a selected entry
    #[error("skeleton codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// The hash registry file is missing or malformed
    #[error("hash registry {path}: {reason}")]
    Registry { path: String, reason: String },

    /// The container's binary layout is malformed
    #[error("malformed container {name}: {reason}")]
    Container { name: String, reason: String },

    /// A passthrough entry carries a compression kind the output format
    /// cannot reproduce
    #[error("entry {hash:016x} has unsupported compression kind {kind}")]
    UnsupportedKind { hash: u64, kind: &'static str },

    /// The descriptor version is not a one-decimal fixed-point string
    #[error("invalid version string {0:?}: expected a value like \"1.3\"")]
    Version(String),
}
