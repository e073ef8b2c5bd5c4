//! Settings resolution: merging `gaspack.toml` with command-line flags.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::types::ProjectConfig;

/// Build flags taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct BuildFlags {
    /// Raw `--pages` value (comma-separated page names).
    pub pages: Option<String>,
    /// `--changed`: skip units whose digest is unchanged.
    pub only_changed: bool,
    /// `--skip-server`: never build the backend bundle.
    pub skip_server: bool,
}

/// Immutable settings for one build run.
///
/// Constructed once at startup and passed by reference to every step; no
/// build step reads process arguments or environment on its own.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Project root; bundler processes run from here.
    pub project_root: PathBuf,
    /// Source root the import alias maps to.
    pub src_dir: PathBuf,
    /// Directory holding one subdirectory per page.
    pub pages_dir: PathBuf,
    /// Backend sources.
    pub server_dir: PathBuf,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Scratch directory for per-unit bundler runs.
    pub temp_dir: PathBuf,
    /// Shared markup template.
    pub shared_template: PathBuf,
    /// Global stylesheet.
    pub global_css: PathBuf,
    /// Platform manifest to copy, if present.
    pub manifest: PathBuf,
    /// Project bundler config to inherit, if present.
    pub bundler_config: PathBuf,
    /// Node.js executable.
    pub node: String,
    /// Import prefix that resolves against `src_dir`.
    pub alias: String,
    /// Maximum page builds in flight.
    pub concurrency: usize,
    /// Preferred fallback page for the routing function.
    pub default_page: String,
    /// Restrict the build to these pages, if set.
    pub pages_filter: Option<BTreeSet<String>>,
    /// Skip units whose digest is unchanged.
    pub only_changed: bool,
    /// Never build the backend bundle.
    pub skip_server: bool,
}

/// Combines the project configuration with command-line flags.
pub fn resolve_settings(root: &Path, config: &ProjectConfig, flags: BuildFlags) -> BuildSettings {
    let join = |rel: &str| root.join(rel);
    BuildSettings {
        project_root: root.to_path_buf(),
        src_dir: join(&config.paths.src),
        pages_dir: join(&config.paths.pages),
        server_dir: join(&config.paths.server),
        out_dir: join(&config.paths.out),
        temp_dir: join(&config.paths.temp),
        shared_template: join(&config.paths.template),
        global_css: join(&config.paths.global_css),
        manifest: join(&config.paths.manifest),
        bundler_config: join(&config.bundler.config),
        node: config.bundler.node.clone(),
        alias: config.build.alias.clone(),
        concurrency: config.build.concurrency.max(1),
        default_page: config.build.default_page.clone(),
        pages_filter: flags.pages.as_deref().and_then(parse_page_filter),
        only_changed: flags.only_changed,
        skip_server: flags.skip_server,
    }
}

/// Parses a comma-separated page list.
///
/// Names are trimmed and empty items dropped. An empty or blank value means
/// "no filter" and yields `None`.
pub fn parse_page_filter(raw: &str) -> Option<BTreeSet<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

impl BuildSettings {
    /// Returns `true` if the page passes the `--pages` filter.
    pub fn page_selected(&self, name: &str) -> bool {
        self.pages_filter
            .as_ref()
            .map_or(true, |allow| allow.contains(name))
    }
}
