//! Error types for bundling.

use std::path::PathBuf;

/// Errors that abort a server or page build.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// An I/O error occurred while preparing inputs or writing outputs.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A page's dedicated markup file disappeared after discovery.
    #[error("markup for page '{page}' not found at {path}")]
    MissingMarkup {
        /// The page name.
        page: String,
        /// The expected markup path.
        path: PathBuf,
    },

    /// A page needs the shared template but it does not exist.
    #[error("no index.html for page '{page}' and no shared template at {path}")]
    MissingTemplate {
        /// The page name.
        page: String,
        /// The expected template path.
        path: PathBuf,
    },

    /// The underlying bundler could not be started or exited unsuccessfully.
    #[error("bundler failed for {unit}: {detail}")]
    BundlerFailed {
        /// The unit being built (`server` or `page <name>`).
        unit: String,
        /// Exit status and captured error output.
        detail: String,
    },

    /// The bundler finished but the expected server bundle is missing.
    #[error("bundler produced no output at {path}")]
    MissingOutput {
        /// The expected bundle path.
        path: PathBuf,
    },

    /// The bundler finished but no markup file was found for a page.
    #[error("no .html file found in {dir} after building page '{page}'")]
    NoMarkupOutput {
        /// The page name.
        page: String,
        /// The searched bundler output directory.
        dir: PathBuf,
    },

    /// The transformed server bundle does not parse.
    #[error("syntax error in transformed server bundle: {message} (invalid output saved to {diagnostic})")]
    InvalidSyntax {
        /// The parser's message.
        message: String,
        /// Where the invalid text was saved for inspection.
        diagnostic: PathBuf,
    },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}
