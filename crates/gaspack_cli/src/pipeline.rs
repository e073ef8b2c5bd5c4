//! Digest inputs for build units.
//!
//! A unit's digest must cover every file that can change its artifact.
//! Pages follow their import graph; the backend is digested as a whole tree.

use std::path::{Path, PathBuf};

use gaspack_cache::{digest_files, digest_tree};
use gaspack_common::FileDigest;
use gaspack_config::BuildSettings;
use gaspack_graph::{Entry, ImportResolver, INCLUDED_EXTENSIONS};

/// Extensions of backend sources that feed the server digest.
pub const SERVER_EXTENSIONS: &[&str] = &["ts", "js", "json"];

/// Root component a page's import graph starts from.
const PAGE_COMPONENT: &str = "App.tsx";

/// Lists the files a page's artifact depends on.
///
/// The import graph of the page's root component, the page's own markup or
/// else the shared template, and the global stylesheet. Missing optional
/// inputs are left out. The result is sorted and deduplicated.
pub fn page_inputs(settings: &BuildSettings, resolver: &ImportResolver, entry: &Entry) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let component = settings.pages_dir.join(&entry.name).join(PAGE_COMPONENT);
    if component.is_file() {
        files.extend(resolver.collect_graph(&component));
    }

    match &entry.markup {
        Some(markup) => files.push(markup.clone()),
        None if settings.shared_template.is_file() => files.push(settings.shared_template.clone()),
        None => {}
    }

    if settings.global_css.is_file() {
        files.push(settings.global_css.clone());
    }

    files.retain(|f| has_included_extension(f));
    files.sort();
    files.dedup();
    files
}

/// Digest of a page's inputs.
pub fn page_digest(settings: &BuildSettings, resolver: &ImportResolver, entry: &Entry) -> FileDigest {
    digest_files(&page_inputs(settings, resolver, entry))
}

/// Digest of the backend sources, including the generated routing module.
pub fn server_digest(settings: &BuildSettings) -> FileDigest {
    let (digest, files) = digest_tree(&settings.server_dir, SERVER_EXTENSIONS);
    tracing::debug!("server digest {digest} over {} file(s)", files.len());
    digest
}

fn has_included_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| INCLUDED_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}
