//! Errors raised while reading `gaspack.toml`.

use std::path::PathBuf;

/// Reasons a project configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists (or was named explicitly) but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// A value parsed but cannot drive a build.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Dotted key of the offending setting, such as `build.concurrency`.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
