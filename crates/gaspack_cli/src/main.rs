//! gaspack: builds a sheet-backed script project for deployment.
//!
//! Produces one backend script (`Code.js`) with top-level function
//! declarations the platform can register, one self-contained markup file
//! per page, the staged auxiliary templates and the platform manifest, all
//! in the output directory. With `--changed` only units whose inputs changed
//! are rebuilt.

#![warn(missing_docs)]

mod build;
mod pipeline;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use gaspack_bundle::ViteBundler;
use gaspack_config::{load_config, load_config_file, resolve_settings, BuildFlags};
use gaspack_graph::normalize;
use tracing_subscriber::EnvFilter;

use crate::build::{run_build, ServerOutcome};

/// Page and server packager for sheet-backed script projects.
#[derive(Parser, Debug)]
#[command(name = "gaspack", version, about = "Build server code and single-file pages")]
pub struct Cli {
    /// Build only these pages (comma-separated names).
    #[arg(long, value_name = "NAMES")]
    pub pages: Option<String>,

    /// Skip units whose inputs and artifact are unchanged since the last build.
    #[arg(long)]
    pub changed: bool,

    /// Never build the server bundle.
    #[arg(long)]
    pub skip_server: bool,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a custom `gaspack.toml` configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the config file's directory, else the
    /// current directory).
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(cli.quiet, cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(&cli)?;
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_config(&root)?,
    };
    let flags = BuildFlags {
        pages: cli.pages,
        only_changed: cli.changed,
        skip_server: cli.skip_server,
    };
    let settings = resolve_settings(&root, &config, flags);
    tracing::info!("project root: {}", settings.project_root.display());

    let bundler = ViteBundler::new(&settings);
    let report = run_build(&settings, &bundler).await?;

    let server = match &report.server {
        ServerOutcome::Built(built) => match built.transform {
            Some((tier, _)) => format!("built ({tier} extraction)"),
            None => "copied unchanged".to_string(),
        },
        ServerOutcome::Unchanged => "unchanged".to_string(),
        ServerOutcome::Skipped => "skipped".to_string(),
    };
    tracing::info!(
        "server {server}, {} page(s) built, {} unchanged, {} template(s) copied, {} pruned",
        report.pages_built.len(),
        report.pages_unchanged.len(),
        report.templates_copied.len(),
        report.pruned.len()
    );
    Ok(0)
}

/// Picks the project root: `--root`, else the directory of `--config`, else
/// the current directory. Relative paths are made absolute.
fn resolve_project_root(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let root = match (&cli.root, &cli.config) {
        (Some(root), _) => root.clone(),
        (None, Some(config)) => config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        (None, None) => PathBuf::from("."),
    };
    let root = if root.is_absolute() {
        root
    } else {
        normalize(&cwd.join(root))
    };
    if !root.is_dir() {
        return Err(format!("project root {} is not a directory", root.display()).into());
    }
    Ok(root)
}
