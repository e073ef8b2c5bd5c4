//! Bundling for the deployment target.
//!
//! The target runtime has no module system: it registers top-level function
//! declarations from plain script files and serves standalone markup files.
//! This crate drives the underlying bundler (through the [`Bundler`] seam)
//! and reshapes its output for that runtime:
//!
//! - [`server`]: one backend script, unwrapped from its immediately-invoked
//!   function wrapper, stripped of module artifacts, and syntax-checked.
//! - [`page`]: one self-contained markup file per page.
//! - [`routing`]: the generated backend entry point that serves pages by name.

#![warn(missing_docs)]

pub mod bundler;
pub mod error;
pub mod extract;
pub mod page;
pub mod parser;
pub mod routing;
pub mod server;
pub mod strip;

pub use bundler::{Bundler, PageJob, ServerJob, ViteBundler};
pub use error::BundleError;
pub use extract::{extract_body, Tier};
pub use page::{build_page, entry_script, render_markup};
pub use parser::ParseError;
pub use routing::{default_page, render_routing_module, write_routing_module, ROUTING_MODULE};
pub use server::{
    build_server, transform_bundle, validate, ServerReport, Validation, INVALID_ARTIFACT, SERVER_ENTRY,
};
pub use strip::strip_module_artifacts;
