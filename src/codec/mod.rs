// src/codec/mod.rs

//! Skeleton codec seam
//!
//! The migration pipeline only knows "feed legacy bytes in, get current
//! bytes out". Everything about the skeleton asset's binary layout lives
//! behind [`SkeletonCodec`]; the pipeline never looks inside the decoded
//! model.

pub mod skl;

pub use skl::SklCodec;

use thiserror::Error;

/// Errors raised by a skeleton codec
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload does not start with a known skeleton magic
    #[error("not a skeleton asset: unrecognized magic")]
    BadMagic,

    /// The payload uses a revision this codec cannot read
    #[error("unsupported skeleton revision {0}")]
    UnsupportedVersion(u32),

    /// The payload ended before a declared field
    #[error("truncated skeleton data: {0}")]
    Truncated(String),

    /// The payload is structurally inconsistent
    #[error("malformed skeleton data: {0}")]
    Malformed(String),
}

/// A decoded skeleton asset.
///
/// Opaque to the pipeline; only codec implementations construct or read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub(crate) name: String,
    pub(crate) joints: Vec<Joint>,
    pub(crate) influences: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Joint {
    pub(crate) name: String,
    pub(crate) parent: i16,
    pub(crate) radius: f32,
    pub(crate) local: Transform,
    pub(crate) inverse_global: Transform,
}

/// Translation / scale / rotation-quaternion triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transform {
    pub(crate) translation: [f32; 3],
    pub(crate) scale: [f32; 3],
    pub(crate) rotation: [f32; 4],
}

impl Transform {
    pub(crate) const IDENTITY: Self = Self {
        translation: [0.0; 3],
        scale: [1.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };
}

/// Decode a legacy skeleton, re-encode it at the current revision.
pub trait SkeletonCodec {
    /// Decode a skeleton payload (any revision the codec understands)
    fn decode(&self, data: &[u8]) -> Result<Skeleton, CodecError>;

    /// Encode a skeleton at the current revision
    fn encode(&self, skeleton: &Skeleton) -> Result<Vec<u8>, CodecError>;

    /// Full read/write round trip: legacy bytes in, current bytes out
    fn transcode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let skeleton = self.decode(data)?;
        self.encode(&skeleton)
    }
}
