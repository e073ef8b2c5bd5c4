//! Incremental build cache management.
//!
//! This crate provides content-digest-based change detection for build units
//! (the server bundle, each page, each staged template) and the persisted
//! cache that lets unchanged units be skipped on the next run.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod hasher;
pub mod state;

pub use cache::{BuildCache, CacheLoad, PruneReport, Unit, SERVER_ARTIFACT};
pub use error::CacheError;
pub use hasher::{digest_files, digest_tree};
pub use state::{CacheState, LoadOutcome, CACHE_FILE};
