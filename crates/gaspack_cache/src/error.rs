//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Cache operations are fail-safe from the build's point of view: a failed
/// load becomes an empty cache and a failed save or prune is logged. This
/// enum carries the details for those log lines.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files or artifacts.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache state could not be parsed as valid JSON.
    #[error("failed to parse build cache: {reason}")]
    StateParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// A serialization error occurred while writing the cache state.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
