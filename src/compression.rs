// src/compression.rs

//! Compression codecs for container payloads
//!
//! The container stores entries either raw or zstd-compressed; legacy
//! containers can additionally carry gzip entries, which are decoded for
//! transcoding but never produced on output.

use std::io::Read;
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("failed to compress with {format}: {source}")]
    Compression {
        format: &'static str,
        source: std::io::Error,
    },

    #[error("failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: std::io::Error,
    },
}

/// Compress a payload with zstd at the default level
pub fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    zstd::encode_all(data, 0).map_err(|e| CompressionError::Compression {
        format: "zstd",
        source: e,
    })
}

/// Decompress a zstd payload fully into memory
pub fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    zstd::decode_all(data).map_err(|e| CompressionError::Decompression {
        format: "zstd",
        source: e,
    })
}

/// Decompress a gzip payload fully into memory
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Decompression {
            format: "gzip",
            source: e,
        })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_round_trip() {
        let data = b"skeleton payload bytes, repeated: skeleton payload bytes";
        let compressed = zstd_compress(data).unwrap();
        assert_eq!(zstd_decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_zstd_decompress_garbage_fails() {
        assert!(zstd_decompress(&[0x00, 0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn test_gzip_decompress() {
        // Minimal gzip of "hello"
        let gzip_data: &[u8] = &[
            0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xcb, 0x48, 0xcd, 0xc9,
            0xc9, 0x07, 0x00, 0x86, 0xa6, 0x10, 0x36, 0x05, 0x00, 0x00, 0x00,
        ];
        assert_eq!(gzip_decompress(gzip_data).unwrap(), b"hello");
    }
}
