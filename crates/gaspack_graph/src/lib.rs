//! Static source analysis for the build: page discovery and import graphs.
//!
//! Nothing here invokes the bundler. The import graph is recovered with a
//! lightweight specifier scan that is good enough to decide which files can
//! influence a page, which is all incremental rebuild decisions need.

#![warn(missing_docs)]

pub mod discover;
pub mod path;
pub mod resolve;
pub mod scan;

pub use discover::{discover_entries, discover_templates, Entry, TemplateFile};
pub use path::normalize;
pub use resolve::{ImportResolver, CODE_EXTENSIONS, INCLUDED_EXTENSIONS, PROBE_EXTENSIONS};
pub use scan::scan_specifiers;
