//! Shared foundational types used across the gaspack build pipeline.
//!
//! This crate provides the content digest used for cache invalidation, an
//! iterative directory walker, and the typed result used for best-effort
//! operations whose failure degrades the build instead of aborting it.

#![warn(missing_docs)]

pub mod digest;
pub mod recover;
pub mod walk;

pub use digest::{DigestBuilder, FileDigest, ParseDigestError};
pub use recover::Recoverable;
pub use walk::{find_first_file, walk_files};
