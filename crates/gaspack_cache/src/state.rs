//! Persisted build cache state.
//!
//! The state is stored as `.build-cache.json` in the output directory and
//! records the digest each unit had when it was last built successfully.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use gaspack_common::FileDigest;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CacheError;

/// Name of the cache state file within the output directory.
pub const CACHE_FILE: &str = ".build-cache.json";

/// Digests of the last successful build of every unit.
///
/// Serialized as pretty-printed JSON:
/// `{ "server": "<hex>", "pages": { name: hex }, "templates": { key: hex } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheState {
    /// Digest of the server sources at the last server build.
    ///
    /// An empty string reads as "never built".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub server: Option<FileDigest>,

    /// Per-page digests, keyed by page name.
    #[serde(default)]
    pub pages: BTreeMap<String, FileDigest>,

    /// Per-template digests, keyed by staged template name.
    #[serde(default)]
    pub templates: BTreeMap<String, FileDigest>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<FileDigest>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(hex) => hex.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// How a [`CacheState`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid state file was read.
    Loaded,
    /// No state file exists yet.
    Missing,
    /// A state file exists but could not be read or parsed.
    Corrupt(String),
}

impl CacheState {
    /// Loads the state from the output directory.
    ///
    /// Never fails: a missing or unreadable file yields the empty default
    /// state, with the reason reported in the [`LoadOutcome`].
    pub fn load(out_dir: &Path) -> (Self, LoadOutcome) {
        let path = out_dir.join(CACHE_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (Self::default(), LoadOutcome::Missing);
            }
            Err(e) => {
                let err = CacheError::Io { path, source: e };
                return (Self::default(), LoadOutcome::Corrupt(err.to_string()));
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => (state, LoadOutcome::Loaded),
            Err(e) => {
                let err = CacheError::StateParse {
                    reason: e.to_string(),
                };
                (Self::default(), LoadOutcome::Corrupt(err.to_string()))
            }
        }
    }

    /// Saves the state to the output directory.
    ///
    /// The JSON is written to a temporary file in the same directory and then
    /// renamed over the previous state, so readers never see a partial file.
    pub fn save(&self, out_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(out_dir).map_err(|e| CacheError::Io {
            path: out_dir.to_path_buf(),
            source: e,
        })?;
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(out_dir).map_err(|e| CacheError::Io {
            path: out_dir.to_path_buf(),
            source: e,
        })?;
        tmp.write_all(json.as_bytes()).map_err(|e| CacheError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;

        let path = out_dir.join(CACHE_FILE);
        tmp.persist(&path).map_err(|e| CacheError::Io {
            path,
            source: e.error,
        })?;
        Ok(())
    }
}
