// src/lib.rs

//! SklFix
//!
//! Migrates legacy Fantome mod packages to the current skeleton asset
//! revision. A package is a zip archive with a `META/` descriptor folder and
//! either a `RAW/` loose-file payload or a `WAD/` container payload. The
//! pipeline discovers packages, classifies their payload entries, routes
//! skeleton assets through the codec, rebuilds a single `.wad.client`
//! container and writes a brand-new package with a bumped version.
//!
//! # Architecture
//!
//! - Registry-first: container entries are addressed by 64-bit path hash;
//!   a static hash registry decides which entries are skeleton assets
//! - One package at a time: no shared mutable state across packages
//! - All-or-nothing output: a package either produces one complete new zip
//!   or nothing at all

pub mod codec;
pub mod compression;
pub mod fantome;
pub mod migrate;
pub mod registry;
pub mod scanner;
pub mod wad;

mod error;

pub use error::{Error, Result};
pub use migrate::{Outcome, SkipReason};
pub use registry::HashRegistry;
