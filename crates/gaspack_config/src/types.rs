//! Configuration types deserialized from `gaspack.toml`.
//!
//! Every section and field is optional; the defaults describe the
//! conventional project layout.

use serde::Deserialize;

/// The top-level project configuration parsed from `gaspack.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Source and output locations, relative to the project root.
    #[serde(default)]
    pub paths: PathsConfig,
    /// How the underlying bundler is invoked.
    #[serde(default)]
    pub bundler: BundlerConfig,
    /// Build behaviour settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Project-relative paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source root; the import alias maps here.
    pub src: String,
    /// Directory holding one subdirectory per page.
    pub pages: String,
    /// Backend sources.
    pub server: String,
    /// Output directory deployed to the platform.
    pub out: String,
    /// Scratch directory for per-unit bundler runs.
    pub temp: String,
    /// Shared markup template for pages without their own `index.html`.
    pub template: String,
    /// Global stylesheet imported by every generated page entry.
    pub global_css: String,
    /// Platform manifest copied verbatim into the output directory.
    pub manifest: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: "src".to_string(),
            pages: "src/client/pages".to_string(),
            server: "src/server".to_string(),
            out: "dist".to_string(),
            temp: ".vite_tmp".to_string(),
            template: "src/client/template.html".to_string(),
            global_css: "src/client/index.css".to_string(),
            manifest: "appsscript.json".to_string(),
        }
    }
}

/// Underlying bundler invocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Node.js executable used to run the generated bundler driver scripts.
    pub node: String,
    /// Project bundler config inherited by every build, if it exists.
    pub config: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            config: "vite.config.ts".to_string(),
        }
    }
}

/// Build behaviour settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum number of page builds in flight at once.
    pub concurrency: usize,
    /// Page served when the request names no known page.
    pub default_page: String,
    /// Import prefix that resolves against the source root.
    pub alias: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            default_page: "home".to_string(),
            alias: "@/".to_string(),
        }
    }
}
