//! The underlying bundler seam.
//!
//! Bundling itself is delegated. [`Bundler`] is the contract the build steps
//! rely on; [`ViteBundler`] fulfils it by generating a small driver script
//! per unit and running it with Node.js from the project root, so the
//! project's own bundler config, aliases and plugins apply.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use gaspack_cache::SERVER_ARTIFACT;
use gaspack_config::BuildSettings;

use crate::error::BundleError;

/// A backend bundling request.
#[derive(Debug, Clone)]
pub struct ServerJob {
    /// Backend entry module.
    pub entry: PathBuf,
    /// Scratch directory owned by this job.
    pub work_dir: PathBuf,
}

impl ServerJob {
    /// Directory the bundle is written to.
    pub fn out_dir(&self) -> PathBuf {
        self.work_dir.join("out")
    }

    /// The immediately-invoked bundle the bundler must produce.
    pub fn output(&self) -> PathBuf {
        self.out_dir().join(SERVER_ARTIFACT)
    }
}

/// A page bundling request.
#[derive(Debug, Clone)]
pub struct PageJob {
    /// Page name.
    pub name: String,
    /// Scratch directory owned by this job.
    pub work_dir: PathBuf,
}

impl PageJob {
    /// Directory holding the prepared markup and generated entry script.
    pub fn page_dir(&self) -> PathBuf {
        self.work_dir.join("page")
    }

    /// The prepared markup the bundler starts from.
    pub fn markup(&self) -> PathBuf {
        self.page_dir().join("index.html")
    }

    /// Directory the self-contained markup is written to, possibly nested.
    pub fn out_dir(&self) -> PathBuf {
        self.work_dir.join("out")
    }
}

/// Produces bundles from prepared inputs.
///
/// Implementations must write the server bundle to [`ServerJob::output`] as
/// one immediately-invoked function expression with no minification, and a
/// page bundle as a single markup file somewhere under [`PageJob::out_dir`]
/// with all scripts and styles inlined.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Bundles the backend.
    async fn bundle_server(&self, job: &ServerJob) -> Result<(), BundleError>;

    /// Bundles one page.
    async fn bundle_page(&self, job: &PageJob) -> Result<(), BundleError>;
}

/// Runs Vite through Node.js.
#[derive(Debug, Clone)]
pub struct ViteBundler {
    node: String,
    project_root: PathBuf,
    config_file: Option<PathBuf>,
    alias: String,
    src_dir: PathBuf,
}

impl ViteBundler {
    /// Creates a bundler for the project described by `settings`.
    ///
    /// The project's bundler config is inherited only if it exists. Without
    /// one, the driver maps the import alias to the source root itself so
    /// generated entry scripts still resolve.
    pub fn new(settings: &BuildSettings) -> Self {
        Self {
            node: settings.node.clone(),
            project_root: settings.project_root.clone(),
            config_file: settings
                .bundler_config
                .is_file()
                .then(|| settings.bundler_config.clone()),
            alias: settings.alias.clone(),
            src_dir: settings.src_dir.clone(),
        }
    }

    fn config_literal(&self) -> String {
        match &self.config_file {
            Some(path) => js_path(path),
            None => "false".to_string(),
        }
    }

    /// Inline `resolve` section, empty when the project config provides it.
    ///
    /// Vite matches a string alias key as a whole path segment, so a
    /// trailing `/` on the alias is dropped from the key.
    fn resolve_block(&self) -> String {
        if self.config_file.is_some() {
            return String::new();
        }
        let key = self.alias.strip_suffix('/').unwrap_or(&self.alias);
        format!(
            "\x20 resolve: {{ alias: {{ {}: {} }} }},\n",
            js_string(key),
            js_path(&self.src_dir)
        )
    }

    fn server_driver(&self, job: &ServerJob) -> String {
        format!(
            "import {{ build }} from 'vite';\n\
             \n\
             await build({{\n\
             \x20 configFile: {config},\n\
             {resolve}\
             \x20 logLevel: 'warn',\n\
             \x20 build: {{\n\
             \x20   emptyOutDir: false,\n\
             \x20   outDir: {out},\n\
             \x20   sourcemap: false,\n\
             \x20   minify: false,\n\
             \x20   lib: {{ entry: {entry}, formats: ['iife'], name: 'globalThis', fileName: 'Code' }},\n\
             \x20   rollupOptions: {{ output: {{ entryFileNames: {file}, extend: true }} }},\n\
             \x20 }},\n\
             }});\n",
            config = self.config_literal(),
            resolve = self.resolve_block(),
            out = js_path(&job.out_dir()),
            entry = js_path(&job.entry),
            file = js_string(SERVER_ARTIFACT),
        )
    }

    fn page_driver(&self, job: &PageJob) -> String {
        format!(
            "import {{ build }} from 'vite';\n\
             import {{ viteSingleFile }} from 'vite-plugin-singlefile';\n\
             \n\
             await build({{\n\
             \x20 configFile: {config},\n\
             {resolve}\
             \x20 logLevel: 'warn',\n\
             \x20 plugins: [viteSingleFile({{ useRecommendedBuildConfig: true }})],\n\
             \x20 build: {{\n\
             \x20   outDir: {out},\n\
             \x20   emptyOutDir: true,\n\
             \x20   rollupOptions: {{ input: {input} }},\n\
             \x20   minify: true,\n\
             \x20   sourcemap: false,\n\
             \x20 }},\n\
             }});\n",
            config = self.config_literal(),
            resolve = self.resolve_block(),
            out = js_path(&job.out_dir()),
            input = js_path(&job.markup()),
        )
    }

    async fn run_driver(&self, unit: &str, work_dir: &Path, script: String) -> Result<(), BundleError> {
        let driver = work_dir.join("build.mjs");
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|e| BundleError::io(work_dir, e))?;
        tokio::fs::write(&driver, script)
            .await
            .map_err(|e| BundleError::io(&driver, e))?;

        tracing::debug!(unit, driver = %driver.display(), "running bundler");
        let output = tokio::process::Command::new(&self.node)
            .arg(&driver)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BundleError::BundlerFailed {
                unit: unit.to_string(),
                detail: format!("cannot start '{}': {e}", self.node),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(unit, "{}", stdout.trim_end());
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BundleError::BundlerFailed {
                unit: unit.to_string(),
                detail: format!("{}\n{}", output.status, stderr.trim_end()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Bundler for ViteBundler {
    async fn bundle_server(&self, job: &ServerJob) -> Result<(), BundleError> {
        self.run_driver("server", &job.work_dir, self.server_driver(job))
            .await
    }

    async fn bundle_page(&self, job: &PageJob) -> Result<(), BundleError> {
        let unit = format!("page {}", job.name);
        self.run_driver(&unit, &job.work_dir, self.page_driver(job))
            .await
    }
}

/// Creates a uniquely named scratch directory under `temp_root`.
///
/// The directory and everything in it is removed when the guard drops,
/// whether the unit succeeded or not.
pub(crate) fn scratch_dir(temp_root: &Path, prefix: &str) -> Result<tempfile::TempDir, BundleError> {
    std::fs::create_dir_all(temp_root).map_err(|e| BundleError::io(temp_root, e))?;
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(temp_root)
        .map_err(|e| BundleError::io(temp_root, e))
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn js_path(path: &Path) -> String {
    js_string(&path.to_string_lossy())
}
