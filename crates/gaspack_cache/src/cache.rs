//! High-level build cache.
//!
//! `BuildCache` ties the persisted [`CacheState`] to the output directory the
//! artifacts live in. A unit is fresh only if its digest matches the recorded
//! one *and* its artifact is still on disk.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use gaspack_common::FileDigest;

use crate::error::CacheError;
use crate::state::{CacheState, LoadOutcome};

/// File name of the server artifact in the output directory.
pub const SERVER_ARTIFACT: &str = "Code.js";

/// A logical build unit tracked by the cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Unit {
    /// The backend bundle.
    Server,
    /// A page, by name.
    Page(String),
    /// A staged auxiliary template, by key.
    Template(String),
}

impl Unit {
    /// File name of the unit's artifact in the output directory.
    pub fn artifact_name(&self) -> String {
        match self {
            Unit::Server => SERVER_ARTIFACT.to_string(),
            Unit::Page(name) | Unit::Template(name) => format!("{name}.html"),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Server => write!(f, "server"),
            Unit::Page(name) => write!(f, "page {name}"),
            Unit::Template(key) => write!(f, "template {key}"),
        }
    }
}

/// Result of [`BuildCache::load`].
pub struct CacheLoad {
    /// The loaded (or empty) cache.
    pub cache: BuildCache,
    /// Whether the persisted state was used.
    pub outcome: LoadOutcome,
}

/// Units dropped by [`BuildCache::prune`].
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Units whose cache entry was removed.
    pub removed: Vec<Unit>,
    /// Artifacts that could not be deleted. Their cache entries are removed anyway.
    pub failures: Vec<CacheError>,
}

/// Cache of unit digests for incremental builds.
///
/// Mutated only by the orchestrator; builders report digests back to it
/// instead of writing here themselves.
pub struct BuildCache {
    out_dir: PathBuf,
    state: CacheState,
}

impl BuildCache {
    /// Creates an empty cache for the given output directory.
    pub fn empty(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            state: CacheState::default(),
        }
    }

    /// Loads the cache persisted in `out_dir`, or starts empty.
    pub fn load(out_dir: &Path) -> CacheLoad {
        let (state, outcome) = CacheState::load(out_dir);
        CacheLoad {
            cache: Self {
                out_dir: out_dir.to_path_buf(),
                state,
            },
            outcome,
        }
    }

    /// Path of the unit's artifact in the output directory.
    pub fn artifact_path(&self, unit: &Unit) -> PathBuf {
        self.out_dir.join(unit.artifact_name())
    }

    /// Returns the recorded digest for a unit.
    pub fn digest(&self, unit: &Unit) -> Option<FileDigest> {
        match unit {
            Unit::Server => self.state.server,
            Unit::Page(name) => self.state.pages.get(name).copied(),
            Unit::Template(key) => self.state.templates.get(key).copied(),
        }
    }

    /// Returns `true` if the unit must be rebuilt.
    ///
    /// A unit is stale when no digest was recorded, the digest differs, or
    /// the artifact is missing from the output directory.
    pub fn is_stale(&self, unit: &Unit, digest: FileDigest) -> bool {
        match self.digest(unit) {
            Some(prev) if prev == digest => !self.artifact_path(unit).is_file(),
            _ => true,
        }
    }

    /// Records the digest of a unit that was just built successfully.
    pub fn record(&mut self, unit: &Unit, digest: FileDigest) {
        match unit {
            Unit::Server => self.state.server = Some(digest),
            Unit::Page(name) => {
                self.state.pages.insert(name.clone(), digest);
            }
            Unit::Template(key) => {
                self.state.templates.insert(key.clone(), digest);
            }
        }
    }

    /// Drops pages and templates that are no longer present, deleting their artifacts.
    ///
    /// Best-effort: deletion failures are collected in the report and the
    /// cache entry is removed regardless. An artifact whose file name also
    /// belongs to a live unit is kept; a root template staged under a
    /// vanished page's name writes to that page's old file.
    pub fn prune(&mut self, pages: &BTreeSet<String>, templates: &BTreeSet<String>) -> PruneReport {
        let mut stale: Vec<Unit> = self
            .state
            .pages
            .keys()
            .filter(|name| !pages.contains(*name))
            .map(|name| Unit::Page(name.clone()))
            .collect();
        stale.extend(
            self.state
                .templates
                .keys()
                .filter(|key| !templates.contains(*key))
                .map(|key| Unit::Template(key.clone())),
        );

        let live: BTreeSet<String> = pages
            .iter()
            .map(|name| Unit::Page(name.clone()))
            .chain(templates.iter().map(|key| Unit::Template(key.clone())))
            .map(|unit| unit.artifact_name())
            .collect();

        let mut report = PruneReport::default();
        for unit in stale {
            let path = self.artifact_path(&unit);
            if live.contains(&unit.artifact_name()) {
                tracing::debug!("{} kept; now owned by a live unit", path.display());
            } else {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        tracing::info!("  -> {} removed ({unit} deleted)", path.display());
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => report.failures.push(CacheError::Io { path, source: e }),
                }
            }
            match &unit {
                Unit::Page(name) => {
                    self.state.pages.remove(name);
                }
                Unit::Template(key) => {
                    self.state.templates.remove(key);
                }
                Unit::Server => {}
            }
            report.removed.push(unit);
        }
        report
    }

    /// Persists the cache state to the output directory.
    pub fn save(&self) -> Result<(), CacheError> {
        self.state.save(&self.out_dir)
    }

    /// Returns the in-memory cache state.
    pub fn state(&self) -> &CacheState {
        &self.state
    }
}
