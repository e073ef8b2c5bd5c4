//! Parsing and resolution of the optional `gaspack.toml` project configuration.
//!
//! This crate reads the project configuration file (falling back to the
//! conventional layout when there is none) and combines it with command-line
//! flags into an immutable [`BuildSettings`] shared by every build step.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{parse_page_filter, resolve_settings, BuildFlags, BuildSettings};
pub use types::*;
